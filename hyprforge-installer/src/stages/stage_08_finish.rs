//! Summary and the optional reboot.

use crate::stages::InstallContext;
use crate::ui::confirm::{confirm_and_run_with, is_affirmative};
use crate::ui::prompt::Prompter;
use crate::ui::style::{self, emoji};
use anyhow::Result;

pub const REBOOT_PROMPT: &str = "Unmount the new system and reboot now? (y/N)";

/// Print the summary, then offer to reboot. Declining is not an error.
///
/// Returns whether a reboot was issued.
pub fn run(ctx: &InstallContext<'_>, prompter: &mut dyn Prompter) -> Result<bool> {
    println!();
    println!("{}", style::success("Installation complete"));
    for line in ctx.plan.summary_lines() {
        println!("   {line}");
    }
    println!(
        "   Partitions: EFI {}  root {}  swap {}  home {}",
        ctx.layout.efi, ctx.layout.root, ctx.layout.swap, ctx.layout.home
    );

    let hal = ctx.hal;
    let rebooting = confirm_and_run_with(
        REBOOT_PROMPT,
        |prompt| Ok(is_affirmative(&prompter.answer(prompt)?)),
        || {
            hal.sync()?;
            hal.unmount_recursive(ctx.root())?;
            println!("{}", style::with(emoji::PARTY, "Rebooting..."));
            hal.reboot()?;
            Ok(())
        },
    )?;

    if !rebooting {
        println!(
            "{}",
            style::with(
                emoji::CLEANUP,
                &format!(
                    "Target left mounted at {}; reboot when ready.",
                    ctx.target_root.display()
                )
            )
        );
    }
    Ok(rebooting)
}
