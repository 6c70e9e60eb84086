use crate::player::ChatPlayer;

/// External text transform evaluated against the sending player.
///
/// Hosts typically bridge this to their placeholder service. The resolver
/// runs on whichever thread the dispatch runs on; a slow resolver blocks
/// that whole dispatch.
pub trait PlaceholderResolver: Send + Sync {
    fn resolve(&self, player: &dyn ChatPlayer, text: &str) -> String;
}

/// Resolver for hosts without a placeholder service. Returns the input
/// unchanged.
pub struct IdentityResolver;

impl PlaceholderResolver for IdentityResolver {
    fn resolve(&self, _player: &dyn ChatPlayer, text: &str) -> String {
        text.to_owned()
    }
}
