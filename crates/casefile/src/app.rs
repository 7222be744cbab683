//! Main application state and update loop

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use alloy::primitives::Bytes;
use casefile_adapters::{Eip1193Adapter, RuntimeProfile, WalletAdapterConfig};
use casefile_core::{
    AccountsSubscription, CaseAction, CaseCard, CaseSummary, Role, WalletSession,
};
use eframe::egui;

use crate::case_card;
use crate::router::{AppRouter, Page};
use crate::state::{load_cases, ShellConfig};
use crate::toasts::ToastQueue;
use crate::ui;
use crate::wallet_panel::{self, WalletPanelAction, WalletPanelState};

type Session = WalletSession<Eip1193Adapter, Arc<ToastQueue>>;

/// Signature produced on the evidence upload page
#[derive(Debug, Clone)]
struct SignedManifest {
    case_id: String,
    signature: Bytes,
}

pub struct App {
    session: Session,
    /// Kept alive for the lifetime of the app; dropping it detaches the listener
    _accounts: Option<AccountsSubscription<Eip1193Adapter, Arc<ToastQueue>>>,
    toasts: Arc<ToastQueue>,
    router: Arc<AppRouter>,
    role: Role,
    cases: Vec<CaseSummary>,
    load_error: Option<String>,
    panel: WalletPanelState,
    developer_controls: bool,
    manifest_note: String,
    signed: Arc<Mutex<Option<SignedManifest>>>,
}

impl App {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let toasts = Arc::new(ToastQueue::default());
        toasts.bind_context(&cc.egui_ctx);

        let wallet_config = WalletAdapterConfig::from_env();
        let panel = WalletPanelState {
            revoke_on_disconnect: wallet_config.revoke_on_disconnect,
            decline_prompts: false,
        };
        let development = wallet_config.runtime_profile == RuntimeProfile::Development;
        let provider = Eip1193Adapter::with_config(wallet_config);
        let developer_controls = development && provider.is_deterministic();

        let session = WalletSession::new(provider, Arc::clone(&toasts));
        let accounts = match session.attach() {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                tracing::warn!("accountsChanged unavailable: {e}");
                None
            }
        };

        let shell = ShellConfig::load();
        let (cases, load_error) = match load_cases(&shell) {
            Ok(cases) => (cases, None),
            Err(e) => {
                tracing::error!("{e:#}");
                (Vec::new(), Some(format!("{e:#}")))
            }
        };
        tracing::info!(role = %shell.role, cases = cases.len(), "shell ready");

        let restoring = session.clone();
        spawn_wallet_task(&cc.egui_ctx, move || async move {
            if let Some(address) = restoring.restore().await {
                tracing::info!(%address, "restored authorized account");
            }
        });

        Self {
            session,
            _accounts: accounts,
            toasts,
            router: Arc::new(AppRouter::default()),
            role: shell.role,
            cases,
            load_error,
            panel,
            developer_controls,
            manifest_note: String::new(),
            signed: Arc::new(Mutex::new(None)),
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        let snapshot = self.session.snapshot();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.heading(
                    egui::RichText::new("⚖ Casefile")
                        .size(22.0)
                        .color(egui::Color32::from_rgb(0, 212, 170)),
                );
                ui.add_space(30.0);
                ui.separator();
                if ui.add_enabled(self.router.can_go_back(), egui::Button::new("◀ Back")).clicked() {
                    self.router.back();
                }
                if ui.button("All cases").clicked() {
                    self.router.home();
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    egui::ComboBox::from_id_salt("role_select")
                        .selected_text(self.role.as_str())
                        .show_ui(ui, |ui| {
                            for role in Role::ALL {
                                ui.selectable_value(&mut self.role, role, role.as_str());
                            }
                        });
                    ui.label("Role:");
                });
            });
            ui.add_space(4.0);
        });

        let action = wallet_panel::render(
            ctx,
            &mut self.panel,
            &snapshot,
            self.session.provider().is_available(),
            self.developer_controls,
        );
        self.handle_wallet_action(ctx, action);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(10.0);
                match self.router.page() {
                    Page::CaseList => self.render_case_list(ui),
                    Page::CaseDetails { case_id } => self.render_case_details(ui, &case_id),
                    Page::EvidenceUpload { case_id } => {
                        self.render_evidence_upload(ui, ctx, &case_id)
                    }
                    Page::NotFound { href } => {
                        ui::styled_heading(ui, "Page not found");
                        ui.label(egui::RichText::new(href).monospace());
                    }
                }
                ui.add_space(20.0);
            });
        });

        self.toasts.render(ctx);
    }
}

impl App {
    fn handle_wallet_action(&mut self, ctx: &egui::Context, action: WalletPanelAction) {
        match action {
            WalletPanelAction::None => {}
            WalletPanelAction::Connect => {
                let session = self.session.clone();
                spawn_wallet_task(ctx, move || async move {
                    session.connect().await;
                });
            }
            WalletPanelAction::Disconnect if self.panel.revoke_on_disconnect => {
                let session = self.session.clone();
                spawn_wallet_task(ctx, move || async move {
                    session.disconnect_and_revoke().await;
                });
            }
            WalletPanelAction::Disconnect => self.session.disconnect(),
            WalletPanelAction::SimulateAccounts(accounts) => {
                if let Err(e) = self.session.provider().debug_inject_accounts_changed(accounts) {
                    tracing::warn!("account simulation failed: {e}");
                }
            }
            WalletPanelAction::SetDeclinePrompts(decline) => {
                if let Err(e) = self.session.provider().debug_set_reject_requests(decline) {
                    tracing::warn!("failed to toggle prompt rejection: {e}");
                }
            }
        }
    }

    fn find_case(&self, case_id: &str) -> Option<&CaseSummary> {
        self.cases.iter().find(|c| c.id == case_id)
    }

    fn render_case_list(&self, ui: &mut egui::Ui) {
        ui::styled_heading(ui, "Cases");
        ui.label(format!("Signed in as {}.", self.role));
        ui.add_space(10.0);

        if let Some(err) = &self.load_error {
            ui::error_message(ui, err);
            return;
        }
        if self.cases.is_empty() {
            ui.label("No cases assigned.");
            return;
        }
        for case in &self.cases {
            case_card::render(ui, &CaseCard::new(case, self.role), &self.router);
            ui.add_space(8.0);
        }
    }

    fn render_case_details(&self, ui: &mut egui::Ui, case_id: &str) {
        let Some(case) = self.find_case(case_id) else {
            ui::error_message(ui, &format!("Unknown case: {case_id}"));
            return;
        };
        let card = CaseCard::new(case, self.role);

        ui::styled_heading(ui, &case.title);
        ui.label(egui::RichText::new(&case.case_number).monospace().weak());
        ui::section_header(ui, "Details");
        egui::Grid::new("case_details")
            .num_columns(2)
            .spacing([20.0, 6.0])
            .show(ui, |ui| {
                ui.label("Status:");
                ui.label(
                    egui::RichText::new(case_card::status_label(&case.status))
                        .color(case_card::status_color(card.status_class())),
                );
                ui.end_row();
                ui.label("Court:");
                ui.label(&case.court_name);
                ui.end_row();
                ui.label("Judge:");
                ui.label(&case.presiding_judge);
                ui.end_row();
                ui.label("Evidence:");
                ui.label(card.evidence_label());
                ui.end_row();
            });

        if card.offers(CaseAction::UploadEvidence) {
            ui.add_space(10.0);
            if ui::primary_button_enabled(ui, CaseAction::UploadEvidence.label(), true).clicked() {
                if let Err(e) = card.trigger(CaseAction::UploadEvidence, &self.router) {
                    tracing::warn!("upload navigation refused: {e}");
                }
            }
        }
    }

    fn render_evidence_upload(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, case_id: &str) {
        let Some(case) = self.find_case(case_id).cloned() else {
            ui::error_message(ui, &format!("Unknown case: {case_id}"));
            return;
        };
        ui::styled_heading(ui, "Upload Evidence");
        ui.label(format!("{} · {}", case.case_number, case.title));

        if !CaseCard::new(&case, self.role).offers(CaseAction::UploadEvidence) {
            ui::error_message(ui, "Only lawyers can upload evidence.");
            return;
        }

        ui::section_header(ui, "Evidence manifest");
        ui.add(
            egui::TextEdit::multiline(&mut self.manifest_note)
                .hint_text("Describe the evidence being submitted")
                .desired_rows(4)
                .desired_width(f32::INFINITY),
        );
        ui.add_space(8.0);

        let snapshot = self.session.snapshot();
        let label = if snapshot.is_signing() {
            "Waiting for wallet…"
        } else {
            "Sign manifest"
        };
        if ui::primary_button_enabled(ui, label, !snapshot.is_signing()).clicked() {
            let message = manifest_message(&case, &self.manifest_note);
            let session = self.session.clone();
            let signed = Arc::clone(&self.signed);
            let case_id = case.id.clone();
            spawn_wallet_task(ctx, move || async move {
                if let Some(signature) = session.sign_message(&message).await {
                    *signed.lock().unwrap_or_else(PoisonError::into_inner) =
                        Some(SignedManifest { case_id, signature });
                }
            });
        }

        let signed = self
            .signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(signed) = signed.filter(|s| s.case_id == case.id) {
            ui::section_header(ui, "Signature");
            let hex = alloy::hex::encode_prefixed(&signed.signature);
            let short = if hex.len() > 24 {
                format!("{}…{}", &hex[..10], &hex[hex.len() - 8..])
            } else {
                hex.clone()
            };
            ui::copyable_value(ui, &short, &hex);
        }
    }
}

/// Text presented to the wallet for `personal_sign`.
fn manifest_message(case: &CaseSummary, note: &str) -> String {
    let mut message = format!(
        "Casefile evidence manifest\nCase: {}\nTitle: {}",
        case.case_number, case.title
    );
    let note = note.trim();
    if !note.is_empty() {
        message.push_str("\nNote: ");
        message.push_str(note);
    }
    message
}

/// Run a wallet future off the UI thread and repaint when it settles.
fn spawn_wallet_task<F, Fut>(ctx: &egui::Context, task: F)
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + 'static,
{
    let ctx = ctx.clone();

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            task().await;
            ctx.request_repaint();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        std::thread::spawn(move || {
            match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(task()),
                Err(e) => tracing::error!("failed to start wallet runtime: {e}"),
            }
            ctx.request_repaint();
        });
    }
}
