//! Headshot options and the fixed prompt template they fill.
//!
//! Every option maps to exactly one fragment, so `build_prompt` is a pure
//! function of `GenerationOptions`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadshotStyle {
    Corporate,
    Startup,
    Creative,
    Executive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundStyle {
    Studio,
    Office,
    Outdoor,
    Gradient,
    Abstract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttireStyle {
    Formal,
    BusinessCasual,
    SmartCasual,
    Creative,
}

/// Options chosen by the user for a generated headshot.
/// Field names are snake_case like every other request body; `headshotStyle`
/// is still accepted from older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(alias = "headshotStyle")]
    pub headshot_style: HeadshotStyle,
    pub background: BackgroundStyle,
    pub attire: AttireStyle,
}

impl HeadshotStyle {
    pub fn description(self) -> &'static str {
        match self {
            Self::Corporate => "professional corporate executive portrait, formal business setting, confident and authoritative",
            Self::Startup => "modern tech startup founder portrait, approachable and innovative, Silicon Valley style",
            Self::Creative => "creative professional portrait, artistic and unique, dynamic and expressive",
            Self::Executive => "C-suite executive portrait, polished and distinguished, leadership presence",
        }
    }
}

impl BackgroundStyle {
    pub fn description(self) -> &'static str {
        match self {
            Self::Studio => "clean studio backdrop with soft professional lighting, neutral gray background",
            Self::Office => "modern office environment background with soft bokeh, professional workspace",
            Self::Outdoor => "outdoor setting with natural light, soft green bokeh background, park or garden",
            Self::Gradient => "smooth gradient backdrop, professional studio lighting, blue to gray gradient",
            Self::Abstract => "abstract artistic background, creative colorful bokeh, unique and modern",
        }
    }
}

impl AttireStyle {
    pub fn description(self) -> &'static str {
        match self {
            Self::Formal => "wearing a tailored dark suit with tie, crisp white shirt, professional formal attire",
            Self::BusinessCasual => "wearing a blazer without tie, professional but relaxed, business casual attire",
            Self::SmartCasual => "wearing a collared shirt or polo, polished casual look, smart casual attire",
            Self::Creative => "wearing stylish modern clothing, creative professional attire, fashion-forward",
        }
    }
}

/// Headshot prompt template. Replace `{style}`, `{attire}`, `{background}`.
pub const HEADSHOT_PROMPT_TEMPLATE: &str = "Professional LinkedIn headshot portrait photo, \
    {style}, {attire}, {background}, high quality, sharp focus, professional photography, 8k, \
    studio lighting, looking at camera, friendly confident expression, shoulders and head \
    visible, centered composition";

pub const HEADSHOT_NEGATIVE_PROMPT: &str = "blurry, bad quality, distorted, ugly, deformed, \
    cartoon, anime, illustration, painting, drawing, text, watermark, signature, cropped, out of \
    frame, worst quality, low quality, jpeg artifacts, duplicate, morbid, mutilated, extra \
    fingers, mutated hands, poorly drawn hands, poorly drawn face, mutation, deformed, \
    disfigured, gross proportions, malformed limbs, missing arms, missing legs, extra arms, \
    extra legs, fused fingers, too many fingers, long neck";

/// Builds the headshot prompt for the given options.
pub fn build_prompt(options: &GenerationOptions) -> String {
    HEADSHOT_PROMPT_TEMPLATE
        .replace("{style}", options.headshot_style.description())
        .replace("{attire}", options.attire.description())
        .replace("{background}", options.background.description())
}
