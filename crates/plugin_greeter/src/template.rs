//! Placeholder substitution for configured message templates.

/// Token replaced with the player's display name.
pub const PLAYER_PLACEHOLDER: &str = "{player}";

/// Replaces every `{player}` in `template` with `player_name`.
///
/// The name is inserted literally: a name that itself contains `{player}` is
/// not substituted again. Templates without the token come back unchanged.
pub fn render(template: &str, player_name: &str) -> String {
    template.replace(PLAYER_PLACEHOLDER, player_name)
}
