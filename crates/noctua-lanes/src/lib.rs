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

//! # Noctua Lanes
//!
//! Stateless hot-path pipelines for the asset core: the validation lane
//! gates proposed metadata before anything is loaded or cached, and the
//! fallback lane constructs minimal placeholder payloads for assets that
//! failed to load.

pub mod fallback_lane;
pub mod validation_lane;

pub use fallback_lane::{FallbackContext, FallbackError, FallbackFactory, FallbackSet};
pub use validation_lane::{ValidationLane, ValidationRules};
