//! Presentation layer.
//!
//! [`Surface`] is the seam between decision logic and whatever renders it (a
//! page, or [`HeadlessSurface`] for simulations and tests). The functions in
//! this module translate an [`EffectPlan`] into surface calls; nothing here
//! computes levels or intensities.

pub mod delays;
pub mod headless;

use crate::checklist::ChecklistView;
use crate::escalation::{ColorOverlay, EffectPlan, StatusIndicator};

pub use delays::{ClickDecision, DelayRegistry};
pub use headless::HeadlessSurface;

/// Opaque handle to an element on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// "Did the player's end screen appear" signal for the checklist gate.
pub trait EndScreenProbe {
    fn end_screen_visible(&self) -> bool;
}

/// A rendering target. `None` removes the corresponding artifact.
pub trait Surface: EndScreenProbe {
    fn set_page_filter(&mut self, filter: Option<&str>);

    fn set_page_opacity(&mut self, opacity: Option<f64>);

    /// Brightness/contrast compensation applied to every image.
    fn set_image_filter(&mut self, filter: Option<&str>);

    fn set_color_overlay(&mut self, overlay: Option<&ColorOverlay>);

    fn set_playback_rate(&mut self, rate: f64);

    fn show_status(&mut self, status: Option<&StatusIndicator>);

    fn show_speed_indicator(&mut self, rate: Option<f64>);

    fn show_video_counter(&mut self, count: Option<u64>);

    fn show_checklist(&mut self, view: Option<&ChecklistView>);

    /// Elements matching the interaction-delay selectors.
    fn delay_targets(&self) -> Vec<ElementId>;

    /// Mark an element as waiting on a delayed click.
    fn set_busy(&mut self, element: ElementId, busy: bool);

    /// Perform the element's click action.
    fn dispatch_click(&mut self, element: ElementId);
}

pub fn image_filter_css(percent: f64) -> String {
    format!("brightness({percent}%) contrast({percent}%)")
}

pub fn speed_label(rate: f64) -> String {
    format!("Speed: {rate:.1}x")
}

pub fn video_counter_label(count: u64) -> String {
    format!("Videos: {count}")
}

/// Render a plan. Re-rendering an unchanged plan is a no-op visually.
pub fn render_plan<S: Surface + ?Sized>(surface: &mut S, plan: &EffectPlan) {
    let visual = &plan.visual;
    surface.set_page_opacity(Some(visual.opacity));
    surface.set_page_filter(visual.page_filter_css().as_deref());

    if let Some(percent) = plan.image_compensation_percent {
        surface.set_image_filter(Some(&image_filter_css(percent)));
    }
    if let Some(overlay) = &plan.color_overlay {
        surface.set_color_overlay(Some(overlay));
    }
    if let Some(rate) = plan.playback_rate {
        surface.set_playback_rate(rate);
        surface.show_speed_indicator((rate != 1.0).then_some(rate));
    }

    surface.show_status(Some(&plan.status));
}

/// Remove every rendered artifact and restore normal playback. Idempotent.
pub fn clear_surface<S: Surface + ?Sized>(surface: &mut S) {
    surface.set_page_opacity(None);
    surface.set_page_filter(None);
    surface.set_image_filter(None);
    surface.set_color_overlay(None);
    surface.show_status(None);
    surface.show_speed_indicator(None);
    surface.show_video_counter(None);
    surface.show_checklist(None);
    surface.set_playback_rate(1.0);
}
