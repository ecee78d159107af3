//! List command handler.

use color_eyre::Result;

use crate::migrations::catalog::create_register;

/// Print the upgrade steps in run order.
pub fn run_list() -> Result<()> {
    let register = create_register();
    println!("Catalog upgrade to v{}", register.target_version());
    for step in register.iter() {
        match step.ticket() {
            Some(ticket) => println!("  {:<30} {} ({})", step.id(), step.description(), ticket),
            None => println!("  {:<30} {}", step.id(), step.description()),
        }
    }
    Ok(())
}
