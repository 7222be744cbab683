//! Wallet side panel: connection status, address and connect controls

use alloy::primitives::{address, Address};
use casefile_core::{short_address, ConnectionStatus, WalletSnapshot};
use eframe::egui;

use crate::ui;

/// Second account offered by the developer controls.
const ALTERNATE_ACCOUNT: Address = address!("2000000000000000000000000000000000000002");

/// Action requested by the wallet panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletPanelAction {
    None,
    Connect,
    Disconnect,
    SimulateAccounts(Vec<Address>),
    SetDeclinePrompts(bool),
}

#[derive(Debug, Default)]
pub struct WalletPanelState {
    pub revoke_on_disconnect: bool,
    pub decline_prompts: bool,
}

pub fn status_text(snapshot: &WalletSnapshot) -> (&'static str, egui::Color32) {
    match snapshot.status {
        ConnectionStatus::Disconnected => ("Not connected", egui::Color32::GRAY),
        ConnectionStatus::Connecting => ("Connecting…", egui::Color32::from_rgb(220, 170, 40)),
        ConnectionStatus::Connected => ("Connected", egui::Color32::from_rgb(80, 200, 120)),
        ConnectionStatus::Signing => ("Awaiting signature…", egui::Color32::from_rgb(70, 140, 230)),
    }
}

pub fn render(
    ctx: &egui::Context,
    panel: &mut WalletPanelState,
    snapshot: &WalletSnapshot,
    provider_available: bool,
    developer_controls: bool,
) -> WalletPanelAction {
    let mut action = WalletPanelAction::None;

    egui::SidePanel::right("wallet_panel")
        .resizable(true)
        .default_width(240.0)
        .min_width(180.0)
        .show(ctx, |ui| {
            ui.add_space(10.0);
            ui.heading(egui::RichText::new("Wallet").size(16.0).strong());
            ui.separator();

            let (label, color) = status_text(snapshot);
            ui.horizontal(|ui| {
                ui.label("Status:");
                ui.label(egui::RichText::new(label).color(color).strong());
                if snapshot.is_connecting() || snapshot.is_signing() {
                    ui.spinner();
                }
            });

            if let Some(address) = snapshot.address {
                ui.add_space(4.0);
                ui::copyable_value(ui, &short_address(address), &address.to_checksum(None));
            }

            if !provider_available {
                ui.add_space(6.0);
                ui.label(
                    egui::RichText::new("No wallet extension detected")
                        .small()
                        .color(egui::Color32::from_rgb(220, 80, 80)),
                );
            }

            ui.add_space(10.0);
            if snapshot.is_connected() {
                if ui::secondary_button(ui, "Disconnect").clicked() {
                    action = WalletPanelAction::Disconnect;
                }
                ui.checkbox(&mut panel.revoke_on_disconnect, "Revoke permission on disconnect");
            } else if ui::primary_button_enabled(ui, "Connect Wallet", !snapshot.is_connecting())
                .clicked()
            {
                action = WalletPanelAction::Connect;
            }

            if developer_controls {
                ui.add_space(10.0);
                egui::CollapsingHeader::new("Developer")
                    .default_open(false)
                    .show(ui, |ui| {
                        if ui.button("Switch account").clicked() {
                            action = WalletPanelAction::SimulateAccounts(vec![ALTERNATE_ACCOUNT]);
                        }
                        if ui.button("Lock wallet").clicked() {
                            action = WalletPanelAction::SimulateAccounts(Vec::new());
                        }
                        if ui
                            .checkbox(&mut panel.decline_prompts, "Decline prompts")
                            .changed()
                        {
                            action = WalletPanelAction::SetDeclinePrompts(panel.decline_prompts);
                        }
                    });
            }
        });

    action
}
