// Concrete directive kinds, looked up by marker tag

pub mod colonize;
pub mod guard;
pub mod outpost;

pub use colonize::ColonizeDirective;
pub use guard::GuardDirective;
pub use outpost::OutpostDirective;

use crate::directive_lifecycle::{DirectiveKind, DirectiveVariant};
use crate::world::VariantTag;

/// Behavior for markers carrying `tag`, or `None` for tags no kind claims
pub fn for_tag(tag: VariantTag) -> Option<Box<dyn DirectiveKind>> {
    let kind: Box<dyn DirectiveKind> = match DirectiveVariant::from_tag(tag)? {
        DirectiveVariant::Outpost => Box::new(OutpostDirective::new()),
        DirectiveVariant::Colonize => Box::new(ColonizeDirective::new()),
        DirectiveVariant::Guard => Box::new(GuardDirective::new()),
    };
    Some(kind)
}
