//! Case card rendering

use casefile_core::{CaseAction, CaseCard, RouterPort, StatusClass};
use eframe::egui;

use crate::ui;

pub fn status_color(class: StatusClass) -> egui::Color32 {
    match class {
        StatusClass::Pending => egui::Color32::from_rgb(220, 170, 40),
        StatusClass::Hearing => egui::Color32::from_rgb(70, 140, 230),
        StatusClass::Closed => egui::Color32::from_rgb(120, 120, 120),
        StatusClass::Default => egui::Color32::from_rgb(160, 160, 190),
    }
}

/// Status text with its first letter capitalized.
pub fn status_label(status: &str) -> String {
    let mut chars = status.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn status_badge(ui: &mut egui::Ui, card: &CaseCard<'_>) {
    let color = status_color(card.status_class());
    egui::Frame::none()
        .stroke(egui::Stroke::new(1.0, color))
        .rounding(10.0)
        .inner_margin(egui::Margin::symmetric(8.0, 2.0))
        .show(ui, |ui| {
            ui.label(
                egui::RichText::new(status_label(&card.case.status))
                    .small()
                    .strong()
                    .color(color),
            );
        });
}

/// Render one case card; buttons navigate through `router`.
pub fn render(ui: &mut egui::Ui, card: &CaseCard<'_>, router: &impl RouterPort) {
    ui::card(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&card.case.title).size(16.0).strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                status_badge(ui, card);
            });
        });
        ui.label(egui::RichText::new(&card.case.case_number).monospace().weak());
        ui.add_space(4.0);
        egui::Grid::new(("case_card", card.case.id.as_str()))
            .num_columns(2)
            .spacing([12.0, 2.0])
            .show(ui, |ui| {
                ui.label("Court:");
                ui.label(&card.case.court_name);
                ui.end_row();
                ui.label("Judge:");
                ui.label(&card.case.presiding_judge);
                ui.end_row();
            });
        ui.label(egui::RichText::new(card.evidence_label()).italics());
        ui.add_space(6.0);
        ui.horizontal(|ui| {
            for action in card.actions() {
                let button = match action {
                    CaseAction::ViewDetails => egui::Button::new(action.label()),
                    CaseAction::UploadEvidence => egui::Button::new(
                        egui::RichText::new(action.label()).color(egui::Color32::WHITE),
                    )
                    .fill(ui::ACCENT),
                };
                if ui.add(button).clicked() {
                    if let Err(e) = card.trigger(action, router) {
                        tracing::warn!("case card action refused: {e}");
                    }
                }
            }
        });
    });
}
