//! Presentation components for quill posts.
//!
//! The compiler renders plain HTML unless a name is bound to a component;
//! this crate provides the default binding used by the site builder.

pub mod admonition;
pub mod pre;

pub use admonition::Admonition;
pub use pre::Pre;

use quill_mdx::{ComponentBinding, DEFAULT_ADMONITION_KINDS};

/// Binding for the default admonition kinds.
pub fn default_binding() -> ComponentBinding {
    binding_for(DEFAULT_ADMONITION_KINDS.iter().copied())
}

/// `pre` bound to [`Pre`], each of `kinds` bound to [`Admonition`].
pub fn binding_for<'a>(kinds: impl IntoIterator<Item = &'a str>) -> ComponentBinding {
    kinds
        .into_iter()
        .fold(ComponentBinding::new().with("pre", Pre), |binding, kind| {
            binding.with(kind, Admonition)
        })
}
