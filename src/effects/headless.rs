//! Recording surface used by `detoxr simulate` and the tests.

use std::collections::BTreeMap;

use super::{ElementId, EndScreenProbe, Surface, speed_label, video_counter_label};
use crate::checklist::ChecklistView;
use crate::constants::DELAY_SELECTORS;
use crate::escalation::{ColorOverlay, StatusIndicator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessElement {
    pub selector: String,
    pub busy: bool,
}

/// Holds the currently rendered state instead of drawing it.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSurface {
    pub page_filter: Option<String>,
    pub page_opacity: Option<f64>,
    pub image_filter: Option<String>,
    pub color_overlay: Option<ColorOverlay>,
    pub playback_rate: f64,
    pub status: Option<StatusIndicator>,
    pub speed_indicator: Option<String>,
    pub video_counter: Option<String>,
    pub checklist: Option<ChecklistView>,
    pub end_screen: bool,
    elements: BTreeMap<ElementId, HeadlessElement>,
    activations: Vec<ElementId>,
    next_element: u64,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            page_filter: None,
            page_opacity: None,
            image_filter: None,
            color_overlay: None,
            playback_rate: 1.0,
            status: None,
            speed_indicator: None,
            video_counter: None,
            checklist: None,
            end_screen: false,
            elements: BTreeMap::new(),
            activations: Vec::new(),
            next_element: 1,
        }
    }

    /// Add an element matching `selector`.
    pub fn add_element(&mut self, selector: &str) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element += 1;
        self.elements.insert(
            id,
            HeadlessElement {
                selector: selector.to_string(),
                busy: false,
            },
        );
        id
    }

    /// Add one element per delay selector.
    pub fn populate_player_controls(&mut self) -> Vec<ElementId> {
        DELAY_SELECTORS.iter().map(|s| self.add_element(s)).collect()
    }

    pub fn element(&self, id: ElementId) -> Option<&HeadlessElement> {
        self.elements.get(&id)
    }

    pub fn is_busy(&self, id: ElementId) -> bool {
        self.elements.get(&id).is_some_and(|e| e.busy)
    }

    /// Clicks that actually went through, in order.
    pub fn activations(&self) -> &[ElementId] {
        &self.activations
    }

    pub fn set_end_screen(&mut self, visible: bool) {
        self.end_screen = visible;
    }

    /// Nothing rendered and playback at normal speed.
    pub fn is_pristine(&self) -> bool {
        self.page_filter.is_none()
            && self.page_opacity.is_none()
            && self.image_filter.is_none()
            && self.color_overlay.is_none()
            && self.status.is_none()
            && self.speed_indicator.is_none()
            && self.video_counter.is_none()
            && self.checklist.is_none()
            && self.playback_rate == 1.0
    }
}

impl EndScreenProbe for HeadlessSurface {
    fn end_screen_visible(&self) -> bool {
        self.end_screen
    }
}

impl Surface for HeadlessSurface {
    fn set_page_filter(&mut self, filter: Option<&str>) {
        self.page_filter = filter.map(str::to_string);
    }

    fn set_page_opacity(&mut self, opacity: Option<f64>) {
        self.page_opacity = opacity;
    }

    fn set_image_filter(&mut self, filter: Option<&str>) {
        self.image_filter = filter.map(str::to_string);
    }

    fn set_color_overlay(&mut self, overlay: Option<&ColorOverlay>) {
        self.color_overlay = overlay.copied();
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.playback_rate = rate;
    }

    fn show_status(&mut self, status: Option<&StatusIndicator>) {
        self.status = status.cloned();
    }

    fn show_speed_indicator(&mut self, rate: Option<f64>) {
        self.speed_indicator = rate.map(speed_label);
    }

    fn show_video_counter(&mut self, count: Option<u64>) {
        self.video_counter = count.map(video_counter_label);
    }

    fn show_checklist(&mut self, view: Option<&ChecklistView>) {
        self.checklist = view.cloned();
    }

    fn delay_targets(&self) -> Vec<ElementId> {
        self.elements
            .iter()
            .filter(|(_, e)| DELAY_SELECTORS.contains(&e.selector.as_str()))
            .map(|(id, _)| *id)
            .collect()
    }

    fn set_busy(&mut self, element: ElementId, busy: bool) {
        if let Some(e) = self.elements.get_mut(&element) {
            e.busy = busy;
        }
    }

    fn dispatch_click(&mut self, element: ElementId) {
        self.activations.push(element);
    }
}
