//! Display configuration and the item/container merge rule.
//!
//! The scheduler never reads these values. Renderers call [`resolve_display`]
//! to combine an item's settings with its container's settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Slide,
    Fade,
    Scale,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Plain,
    Dimmed,
    Blurred,
}

/// Partial display settings; unset fields fall through the merge rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub alignment: Option<Alignment>,
    #[serde(default)]
    pub transition: Option<Transition>,
    #[serde(default)]
    pub shadow: Option<bool>,
    #[serde(default)]
    pub background: Option<Background>,
    #[serde(default)]
    pub dismiss_on_tap: Option<bool>,
}

/// Whether a container lets items position themselves individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Item settings win over container settings.
    #[default]
    PerItem,
    /// Container settings win; item settings only fill gaps.
    Shared,
}

/// Fully resolved settings handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDisplay {
    pub alignment: Alignment,
    pub transition: Transition,
    pub shadow: bool,
    pub background: Background,
    pub dismiss_on_tap: bool,
}

impl Default for ResolvedDisplay {
    /// Defaults used when neither item nor container sets a value:
    /// top alignment, slide transition, no shadow, plain background,
    /// dismiss on tap.
    fn default() -> Self {
        Self {
            alignment: Alignment::Top,
            transition: Transition::Slide,
            shadow: false,
            background: Background::Plain,
            dismiss_on_tap: true,
        }
    }
}

fn pick<T: Copy>(preferred: Option<T>, fallback: Option<T>, default: T) -> T {
    preferred.or(fallback).unwrap_or(default)
}

/// Merge item-level and container-level settings.
pub fn resolve_display(
    item: &DisplayConfig,
    container: &DisplayConfig,
    placement: Placement,
) -> ResolvedDisplay {
    let (first, second) = match placement {
        Placement::PerItem => (item, container),
        Placement::Shared => (container, item),
    };
    let defaults = ResolvedDisplay::default();

    ResolvedDisplay {
        alignment: pick(first.alignment, second.alignment, defaults.alignment),
        transition: pick(first.transition, second.transition, defaults.transition),
        shadow: pick(first.shadow, second.shadow, defaults.shadow),
        background: pick(first.background, second.background, defaults.background),
        dismiss_on_tap: pick(
            first.dismiss_on_tap,
            second.dismiss_on_tap,
            defaults.dismiss_on_tap,
        ),
    }
}
