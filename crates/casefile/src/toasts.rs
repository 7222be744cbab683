//! Transient notification surface fed by the wallet session

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use casefile_core::{Notice, NoticeLevel, NotifierPort};
use eframe::egui;
use web_time::Instant;

const TOAST_TTL: Duration = Duration::from_secs(4);
const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone)]
struct Toast {
    notice: Notice,
    shown_at: Instant,
}

#[derive(Debug, Default)]
pub struct ToastQueue {
    toasts: Mutex<VecDeque<Toast>>,
    repaint: Mutex<Option<egui::Context>>,
}

impl ToastQueue {
    /// Let notices raised from background tasks wake the UI.
    pub fn bind_context(&self, ctx: &egui::Context) {
        *self.repaint.lock().unwrap_or_else(PoisonError::into_inner) = Some(ctx.clone());
    }

    pub fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "toast"),
            _ => tracing::info!(message = %notice.message, "toast"),
        }
        {
            let mut toasts = self.toasts();
            toasts.push_back(Toast {
                notice,
                shown_at: Instant::now(),
            });
            while toasts.len() > MAX_TOASTS {
                toasts.pop_front();
            }
        }
        if let Some(ctx) = self
            .repaint
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            ctx.request_repaint();
        }
    }

    fn prune(&self, now: Instant) {
        self.toasts()
            .retain(|t| now.duration_since(t.shown_at) < TOAST_TTL);
    }

    pub fn render(&self, ctx: &egui::Context) {
        self.prune(Instant::now());
        let toasts: Vec<Toast> = self.toasts().iter().cloned().collect();
        if toasts.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("casefile_toasts"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for toast in &toasts {
                    let (fill, icon) = match toast.notice.level {
                        NoticeLevel::Success => (egui::Color32::from_rgb(28, 110, 64), "✔"),
                        NoticeLevel::Error => (egui::Color32::from_rgb(150, 40, 40), "✖"),
                        NoticeLevel::Info => (egui::Color32::from_rgb(40, 80, 140), "ℹ"),
                    };
                    egui::Frame::none()
                        .fill(fill)
                        .rounding(6.0)
                        .inner_margin(egui::Margin::same(8.0))
                        .show(ui, |ui| {
                            ui.label(
                                egui::RichText::new(format!("{icon} {}", toast.notice.message))
                                    .color(egui::Color32::WHITE),
                            );
                        });
                    ui.add_space(6.0);
                }
            });
        ctx.request_repaint_after(Duration::from_millis(250));
    }

    fn toasts(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        self.toasts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotifierPort for ToastQueue {
    fn notify(&self, notice: Notice) {
        self.push(notice);
    }
}
