use console::{Emoji, style};

pub static MIC: Emoji<'_, '_> = Emoji("🎙️  ", "");
pub static SUN: Emoji<'_, '_> = Emoji("☀️  ", "");
pub static MAIL: Emoji<'_, '_> = Emoji("📧 ", "");
pub static CAMERA: Emoji<'_, '_> = Emoji("📹 ", "");
pub static THERMO: Emoji<'_, '_> = Emoji("🌡️  ", "");
pub static PEN: Emoji<'_, '_> = Emoji("✍️  ", "");
pub static VOICE: Emoji<'_, '_> = Emoji("🎤 ", "");
pub static NOTES: Emoji<'_, '_> = Emoji("🎵 ", "");
pub static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");

pub fn print_step(icon: Emoji<'_, '_>, step: &str) {
    println!("{}{}", icon, style(step).bold());
}

pub fn print_success(msg: &str) {
    println!("{}{}", PARTY, style(msg).green().bold());
}

pub fn print_error(msg: &str) {
    eprintln!("{}{}", ERROR_ICON, style(msg).red().bold());
}
