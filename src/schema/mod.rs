// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Schema loading: GraphQL SDL -> type index, cached behind a registry

pub mod registry;
pub mod sdl;

pub use registry::SchemaRegistry;
pub use sdl::parse_schema;
