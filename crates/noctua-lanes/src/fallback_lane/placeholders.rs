// Copyright 2025 Noctua Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The built-in placeholder payloads and their factories.

use super::{FallbackContext, FallbackError, FallbackFactory};
use noctua_core::asset::LoadedAsset;
use std::any::Any;
use std::sync::Arc;

/// The debug color placeholders render in: loud magenta.
pub const PLACEHOLDER_COLOR: [f32; 4] = [1.0, 0.0, 1.0, 1.0];

/// A minimal stand-in mesh: a unit cube in magenta.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderMesh {
    /// Vertex positions, xyz per vertex.
    pub positions: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`.
    pub indices: Vec<u32>,
    /// Flat RGBA color for every face.
    pub color: [f32; 4],
}

impl PlaceholderMesh {
    /// A unit cube centered on the origin: 8 vertices, 12 triangles.
    pub fn unit_cube() -> Self {
        let positions = vec![
            [-0.5, -0.5, -0.5],
            [0.5, -0.5, -0.5],
            [0.5, 0.5, -0.5],
            [-0.5, 0.5, -0.5],
            [-0.5, -0.5, 0.5],
            [0.5, -0.5, 0.5],
            [0.5, 0.5, 0.5],
            [-0.5, 0.5, 0.5],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 1, 2, 0, 2, 3, // back
            4, 6, 5, 4, 7, 6, // front
            0, 4, 5, 0, 5, 1, // bottom
            3, 2, 6, 3, 6, 7, // top
            0, 3, 7, 0, 7, 4, // left
            1, 5, 6, 1, 6, 2, // right
        ];
        Self {
            positions,
            indices,
            color: PLACEHOLDER_COLOR,
        }
    }
}

impl LoadedAsset for PlaceholderMesh {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A 1×1 neutral gray texture.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderTexture {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA8 pixel data, row-major.
    pub pixels: Vec<u8>,
}

impl PlaceholderTexture {
    /// One opaque mid-gray pixel.
    pub fn neutral() -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![128, 128, 128, 255],
        }
    }
}

impl LoadedAsset for PlaceholderTexture {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A silent mono PCM buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct SilentAudio {
    /// Samples per second.
    pub sample_rate: u32,
    /// Channel count; always 1 for the placeholder.
    pub channels: u16,
    /// One second of zeroed samples.
    pub samples: Vec<f32>,
}

impl SilentAudio {
    /// One second of silence at the given sample rate.
    pub fn one_second(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
            samples: vec![0.0; sample_rate as usize],
        }
    }
}

impl LoadedAsset for SilentAudio {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds [`PlaceholderMesh::unit_cube`] for models and animations.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveMeshFallback;

impl FallbackFactory for PrimitiveMeshFallback {
    fn build(&self, _ctx: &FallbackContext) -> Result<Arc<dyn LoadedAsset>, FallbackError> {
        Ok(Arc::new(PlaceholderMesh::unit_cube()))
    }
}

/// Builds [`PlaceholderTexture::neutral`] for textures and UI assets.
#[derive(Debug, Clone, Copy)]
pub struct NeutralTextureFallback;

impl FallbackFactory for NeutralTextureFallback {
    fn build(&self, _ctx: &FallbackContext) -> Result<Arc<dyn LoadedAsset>, FallbackError> {
        Ok(Arc::new(PlaceholderTexture::neutral()))
    }
}

/// The context key the audio fallback reads its sample rate from.
pub const AUDIO_SAMPLE_RATE_KEY: &str = "audio.sample_rate";

/// Builds [`SilentAudio`] at the context's sample rate (default 44.1 kHz).
#[derive(Debug, Clone, Copy)]
pub struct SilentAudioFallback;

impl FallbackFactory for SilentAudioFallback {
    fn build(&self, ctx: &FallbackContext) -> Result<Arc<dyn LoadedAsset>, FallbackError> {
        let sample_rate = ctx
            .get::<u32>(AUDIO_SAMPLE_RATE_KEY)
            .map(|rate| *rate)
            .unwrap_or(44_100);
        if sample_rate == 0 {
            return Err(FallbackError::Construction {
                detail: "audio context reports a zero sample rate".to_string(),
            });
        }
        Ok(Arc::new(SilentAudio::one_second(sample_rate)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cube_shape() {
        let mesh = PlaceholderMesh::unit_cube();
        assert_eq!(mesh.positions.len(), 8);
        assert_eq!(mesh.indices.len(), 36, "12 triangles");
        assert_eq!(mesh.color, PLACEHOLDER_COLOR);
    }

    #[test]
    fn test_silent_audio_respects_the_context_rate() {
        let mut ctx = FallbackContext::new();
        ctx.insert(AUDIO_SAMPLE_RATE_KEY, 48_000u32);

        let asset = SilentAudioFallback.build(&ctx).unwrap();
        let audio = asset
            .as_any()
            .downcast_ref::<SilentAudio>()
            .expect("payload should be SilentAudio");
        assert_eq!(audio.sample_rate, 48_000);
        assert_eq!(audio.samples.len(), 48_000);
        assert!(audio.samples.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_silent_audio_rejects_a_zero_rate() {
        let mut ctx = FallbackContext::new();
        ctx.insert(AUDIO_SAMPLE_RATE_KEY, 0u32);
        assert!(matches!(
            SilentAudioFallback.build(&ctx),
            Err(FallbackError::Construction { .. })
        ));
    }

    #[test]
    fn test_neutral_texture_is_one_gray_pixel() {
        let texture = PlaceholderTexture::neutral();
        assert_eq!((texture.width, texture.height), (1, 1));
        assert_eq!(texture.pixels, vec![128, 128, 128, 255]);
    }
}
