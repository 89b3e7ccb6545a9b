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

//! # Noctua Agents
//!
//! Orchestrators that drive the data stores and lanes: the
//! [`RecoveryAgent`](recovery_agent::RecoveryAgent) turns loading failures
//! into retried assets, placeholders, or definitive absence, and the
//! [`AssetAgent`](asset_agent::AssetAgent) coordinates cache-through loads
//! with in-flight de-duplication.

pub mod asset_agent;
pub mod recovery_agent;

pub use asset_agent::{AssetAgent, LoadOptions};
pub use recovery_agent::{RecoveryAgent, RecoveryContext, RetryPolicy};
