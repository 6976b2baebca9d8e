// SPDX-License-Identifier: MIT

//! Built-in node catalogue

pub mod draw_text;
pub mod image;
pub mod passthrough;
pub mod resolution;
pub mod router;
pub mod sampler;
pub mod sliders;
pub mod text;

pub use draw_text::{draw_text, ConfigurableDrawText, TextStyle};
pub use image::{CustomImageGridToBatch, ImageBatch};
pub use passthrough::PassThrough;
pub use resolution::{parse_resolution, ResolutionPicker};
pub use router::ConditionalModelRouter;
pub use sampler::{SamplerParameterPacker, SamplerParameterUnpacker, SamplerParams};
pub use sliders::{ControlNetSlider, Slider, SliderOutput, SliderSpec, SLIDERS};
pub use text::{BooleanToEnabled, TextVersions};
