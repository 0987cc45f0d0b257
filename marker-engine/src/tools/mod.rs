/// Pointer-driven marker interaction.
pub mod interaction;
