//! Screens, buttons and the sheet popup.
//!
//! | Mode | Buttons | Keys hit-testable | Popup |
//! |---|---|---|---|
//! | `Normal` | Exit, Select sheet | yes | none |
//! | `SheetPlay` | Exit sheet, Reselect sheet | yes | none |
//! | `SheetSelect` | none | no (modal) | one item per sheet |
//! | `Complete` | none | no | congratulation, times out |
//!
//! Region ids: keys use their note name (`"C4"`), buttons `"button:<name>"`,
//! popup items `"sheet:<index>"`.

use hand_pointer::{HitRegion, Rect, RegionId, RegionKind};
use tracing::warn;

use crate::keyboard::Keyboard;
use crate::sheet::Sheet;
use crate::{SCREEN_H, SCREEN_W};

const BUTTON_W: f32 = 150.0;
const BUTTON_WIDE_W: f32 = 200.0;
const BUTTON_H: f32 = 40.0;
const MARGIN: f32 = 20.0;

const POPUP_W: f32 = 400.0;
const POPUP_MIN_H: f32 = 300.0;
const POPUP_ITEM_H: f32 = 50.0;
const POPUP_ITEM_GAP: f32 = 10.0;
const POPUP_ITEMS_TOP: f32 = 80.0;
const COMPLETE_W: f32 = 400.0;
const COMPLETE_H: f32 = 200.0;

/// Most popup items that fit on the surface with a margin top and bottom.
pub const MAX_POPUP_ITEMS: usize =
    ((SCREEN_H as f32 - 2.0 * MARGIN - POPUP_ITEMS_TOP - POPUP_ITEM_GAP) / (POPUP_ITEM_H + POPUP_ITEM_GAP)) as usize;

// ════════════════════════════════════════════════════════════════════════════
// Mode / UiAction
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    SheetSelect,
    SheetPlay,
    Complete,
}

impl Mode {
    pub fn keys_active(self) -> bool {
        matches!(self, Mode::Normal | Mode::SheetPlay)
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Normal      => "FREE PLAY",
            Mode::SheetSelect => "SELECT SHEET",
            Mode::SheetPlay   => "SHEET PLAY",
            Mode::Complete    => "COMPLETE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    ExitApp,
    OpenSheetSelect,
    ExitSheetMode,
    SelectSheet(usize),
}

// ════════════════════════════════════════════════════════════════════════════
// Button
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct Button {
    pub id:     RegionId,
    pub label:  String,
    pub rect:   Rect,
    pub action: UiAction,
}

impl Button {
    fn new(id: &str, label: impl Into<String>, rect: Rect, action: UiAction) -> Self {
        Button { id: RegionId::new(id), label: label.into(), rect, action }
    }

    pub fn region(&self) -> HitRegion {
        HitRegion::new(self.id.clone(), RegionKind::Button, self.rect)
    }
}

fn button_row(width: f32, specs: [(&str, &str, UiAction); 2]) -> Vec<Button> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, (id, label, action))| {
            let x = MARGIN + i as f32 * (width + MARGIN);
            Button::new(id, label, Rect::from_xywh(x, MARGIN, width, BUTTON_H), action)
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Popup
// ════════════════════════════════════════════════════════════════════════════

/// Modal sheet-selection dialog, centred on the surface.
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub rect:  Rect,
    pub items: Vec<Button>,
}

impl Popup {
    fn for_sheets(sheets: &[Sheet]) -> Self {
        if sheets.len() > MAX_POPUP_ITEMS {
            warn!("{} sheets configured, only the first {} fit the popup", sheets.len(), MAX_POPUP_ITEMS);
        }
        let shown = sheets.len().min(MAX_POPUP_ITEMS);

        let needed = POPUP_ITEMS_TOP + shown as f32 * (POPUP_ITEM_H + POPUP_ITEM_GAP) + POPUP_ITEM_GAP;
        let height = needed.max(POPUP_MIN_H);
        let rect = centred(POPUP_W, height);

        let items = sheets
            .iter()
            .take(shown)
            .enumerate()
            .map(|(i, sheet)| {
                let y = rect.top + POPUP_ITEMS_TOP + i as f32 * (POPUP_ITEM_H + POPUP_ITEM_GAP);
                Button::new(
                    &format!("sheet:{}", i),
                    sheet.name.clone(),
                    Rect::from_xywh(rect.left + MARGIN, y, POPUP_W - 2.0 * MARGIN, POPUP_ITEM_H),
                    UiAction::SelectSheet(i),
                )
            })
            .collect();

        Popup { rect, items }
    }
}

fn centred(w: f32, h: f32) -> Rect {
    let x = ((SCREEN_W as f32 - w) / 2.0).floor();
    let y = ((SCREEN_H as f32 - h) / 2.0).floor();
    Rect::from_xywh(x, y, w, h)
}

// ════════════════════════════════════════════════════════════════════════════
// Layout
// ════════════════════════════════════════════════════════════════════════════

/// Everything interactive on screen, for every mode.
#[derive(Clone, Debug)]
pub struct Layout {
    keyboard:       Keyboard,
    normal_buttons: Vec<Button>,
    sheet_buttons:  Vec<Button>,
    popup:          Popup,
    complete_rect:  Rect,
}

impl Layout {
    pub fn new(sheets: &[Sheet]) -> Self {
        Layout {
            keyboard: Keyboard::one_octave(),
            normal_buttons: button_row(BUTTON_W, [
                ("button:exit",   "Exit",         UiAction::ExitApp),
                ("button:select", "Select sheet", UiAction::OpenSheetSelect),
            ]),
            sheet_buttons: button_row(BUTTON_WIDE_W, [
                ("button:exit_sheet", "Exit sheet",     UiAction::ExitSheetMode),
                ("button:reselect",   "Reselect sheet", UiAction::OpenSheetSelect),
            ]),
            popup: Popup::for_sheets(sheets),
            complete_rect: centred(COMPLETE_W, COMPLETE_H),
        }
    }

    pub fn keyboard(&self) -> &Keyboard { &self.keyboard }
    pub fn popup(&self) -> &Popup { &self.popup }
    pub fn complete_rect(&self) -> Rect { self.complete_rect }

    /// Buttons (or popup items) that can be clicked in `mode`.
    pub fn buttons(&self, mode: Mode) -> &[Button] {
        match mode {
            Mode::Normal      => &self.normal_buttons,
            Mode::SheetPlay   => &self.sheet_buttons,
            Mode::SheetSelect => &self.popup.items,
            Mode::Complete    => &[],
        }
    }

    /// Ordered hit regions for `mode`: keys first in drawing order, then
    /// buttons.  Priority comes from the tiers, not from this order.
    pub fn regions(&self, mode: Mode) -> Vec<HitRegion> {
        let mut out = Vec::new();
        if mode.keys_active() {
            out.extend(self.keyboard.regions());
        }
        out.extend(self.buttons(mode).iter().map(Button::region));
        out
    }

    pub fn action_for(&self, mode: Mode, id: &RegionId) -> Option<UiAction> {
        self.buttons(mode).iter().find(|b| &b.id == id).map(|b| b.action)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::builtin_sheets;
    use hand_pointer::{resolve, Point};
    use test_case::test_case;

    fn layout() -> Layout { Layout::new(&builtin_sheets()) }

    #[test]
    fn normal_buttons_geometry() {
        let l = layout();
        let b = l.buttons(Mode::Normal);
        assert_eq!(b[0].rect, Rect::from_xywh(20.0, 20.0, 150.0, 40.0));
        assert_eq!(b[1].rect, Rect::from_xywh(190.0, 20.0, 150.0, 40.0));
        assert_eq!(b[1].action, UiAction::OpenSheetSelect);
    }

    #[test]
    fn sheet_buttons_are_wider() {
        let l = layout();
        let b = l.buttons(Mode::SheetPlay);
        assert_eq!(b[0].rect, Rect::from_xywh(20.0, 20.0, 200.0, 40.0));
        assert_eq!(b[1].rect, Rect::from_xywh(240.0, 20.0, 200.0, 40.0));
    }

    #[test]
    fn popup_geometry() {
        let l = layout();
        let p = l.popup();
        assert_eq!(p.rect, Rect::from_xywh(440.0, 210.0, 400.0, 300.0));
        assert_eq!(p.items.len(), 3);
        assert_eq!(p.items[0].rect, Rect::from_xywh(460.0, 290.0, 360.0, 50.0));
        assert_eq!(p.items[2].rect.top, 290.0 + 120.0);
        assert_eq!(p.items[1].label, "Ode to Joy");
        assert_eq!(p.items[1].action, UiAction::SelectSheet(1));
    }

    #[test]
    fn popup_grows_for_extra_sheets() {
        let sheets: Vec<Sheet> = (0..6).map(|i| Sheet::new(format!("s{}", i), &["C4"])).collect();
        let l = Layout::new(&sheets);
        let p = l.popup();
        assert_eq!(p.items.len(), 6);
        let last = p.items[5].rect;
        assert!(p.rect.contains(Point::new(last.left, last.bottom)));
        assert!(p.rect.top >= 0.0 && p.rect.bottom <= SCREEN_H as f32);
    }

    #[test]
    fn popup_truncates_overflow() {
        let sheets: Vec<Sheet> = (0..40).map(|i| Sheet::new(format!("s{}", i), &["C4"])).collect();
        let l = Layout::new(&sheets);
        assert_eq!(l.popup().items.len(), MAX_POPUP_ITEMS);
        assert!(l.popup().rect.bottom <= SCREEN_H as f32);
    }

    #[test_case(Mode::Normal,      15 ; "normal: 13 keys and 2 buttons")]
    #[test_case(Mode::SheetPlay,   15 ; "sheet play: 13 keys and 2 buttons")]
    #[test_case(Mode::SheetSelect, 3  ; "select: popup items only")]
    #[test_case(Mode::Complete,    0  ; "complete: nothing")]
    fn region_count_per_mode(mode: Mode, expected: usize) {
        assert_eq!(layout().regions(mode).len(), expected);
    }

    #[test]
    fn popup_is_modal_over_keys() {
        let l = layout();
        let regions = l.regions(Mode::SheetSelect);
        let c4 = l.keyboard().key("C4").unwrap().rect.center();
        assert!(resolve(c4, &regions).is_none());
    }

    #[test]
    fn actions_are_mode_scoped() {
        let l = layout();
        let exit = RegionId::new("button:exit");
        assert_eq!(l.action_for(Mode::Normal, &exit), Some(UiAction::ExitApp));
        assert_eq!(l.action_for(Mode::SheetPlay, &exit), None);
        assert_eq!(
            l.action_for(Mode::SheetSelect, &RegionId::new("sheet:2")),
            Some(UiAction::SelectSheet(2))
        );
    }

    #[test]
    fn buttons_never_overlap_keys() {
        let l = layout();
        let regions = l.regions(Mode::SheetPlay);
        for b in l.buttons(Mode::SheetPlay) {
            let hit = resolve(b.rect.center(), &regions).unwrap();
            assert_eq!(hit.id, b.id);
        }
    }
}
