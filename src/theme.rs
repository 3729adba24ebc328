//! Embed colours and emoji shared by the wisps.

pub const BLACK: u32 = 0x00_00_00;
pub const RED: u32 = 0xFF_00_00;
pub const GOLD: u32 = 0xFF_D7_00;

pub const ANARCHIST: &str = "Ⓐ";
pub const SOLIDARITY: &str = "✨";
pub const REVOLUTION: &str = "⚔️";
pub const PEACE: &str = "🕊️";
pub const VOTE: &str = "📊";
pub const ASSEMBLY: &str = "🏛️";
pub const REMINDER: &str = "⏰";

pub const FOOTER: &str = "No Gods, No Masters | Power to the People";
