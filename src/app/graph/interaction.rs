use eframe::egui::{self, EventFilter, Key, Modifiers, Rect, Ui};

use crate::session::KeyCommand;

use super::super::ViewModel;

/// Checked in order; Shift+Tab must come before Tab.
const KEY_BINDINGS: [(Modifiers, Key, KeyCommand); 18] = [
    (Modifiers::SHIFT, Key::Tab, KeyCommand::Previous),
    (Modifiers::NONE, Key::Tab, KeyCommand::Next),
    (Modifiers::NONE, Key::ArrowRight, KeyCommand::NeighborForward),
    (Modifiers::NONE, Key::ArrowDown, KeyCommand::NeighborForward),
    (Modifiers::NONE, Key::ArrowLeft, KeyCommand::NeighborBackward),
    (Modifiers::NONE, Key::ArrowUp, KeyCommand::NeighborBackward),
    (Modifiers::NONE, Key::Home, KeyCommand::First),
    (Modifiers::NONE, Key::End, KeyCommand::Last),
    (Modifiers::NONE, Key::Enter, KeyCommand::Activate),
    (Modifiers::NONE, Key::Space, KeyCommand::Activate),
    (Modifiers::NONE, Key::E, KeyCommand::ToggleExpand),
    (Modifiers::NONE, Key::Escape, KeyCommand::ClearFocus),
    (Modifiers::NONE, Key::Plus, KeyCommand::ZoomIn),
    (Modifiers::NONE, Key::Equals, KeyCommand::ZoomIn),
    (Modifiers::NONE, Key::Minus, KeyCommand::ZoomOut),
    (Modifiers::NONE, Key::Num0, KeyCommand::ResetView),
    (Modifiers::NONE, Key::P, KeyCommand::TogglePlay),
    (Modifiers::NONE, Key::H, KeyCommand::Help),
];

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.session
            .store_mut()
            .zoom_about(zoom_factor, pointer - rect.center());
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.session.store_mut().pan_by(response.drag_delta());
        }
    }

    /// Hover, click-to-select and primary-button node dragging.
    pub(in crate::app) fn handle_graph_pointer(&mut self, ui: &Ui, response: &egui::Response) {
        let hovered = self.session.hover(response.hover_pos());
        if hovered.is_some() || self.dragging.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            self.dragging = response
                .interact_pointer_pos()
                .and_then(|pointer| self.session.hit_test(pointer));
        }
        if let Some(index) = self.dragging {
            if let Some(pointer) = response.interact_pointer_pos() {
                self.session.drag(index, pointer);
            }
            if response.drag_stopped() {
                self.session.release(index);
                self.dragging = None;
            }
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            response.request_focus();
            if let Some(pointer) = response.interact_pointer_pos() {
                self.session.click(pointer);
            }
        }
    }

    /// Keyboard navigation while the canvas holds focus. Tab and the arrows
    /// stay on the canvas instead of moving egui's widget focus.
    pub(in crate::app) fn handle_graph_keys(&mut self, ui: &Ui, response: &egui::Response) {
        if !response.has_focus() {
            return;
        }
        ui.memory_mut(|memory| {
            memory.set_focus_lock_filter(
                response.id,
                EventFilter {
                    tab: true,
                    horizontal_arrows: true,
                    vertical_arrows: true,
                    escape: true,
                },
            );
        });

        let commands = ui.input_mut(|input| {
            KEY_BINDINGS
                .iter()
                .filter(|(modifiers, key, _)| input.consume_key(*modifiers, *key))
                .map(|(_, _, command)| *command)
                .collect::<Vec<_>>()
        });
        for command in commands {
            self.session.handle_key(command);
        }
    }
}
