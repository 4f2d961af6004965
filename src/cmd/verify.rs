//! Verify command: report which pipeline artifacts exist.

use super::Project;
use anyhow::{bail, Result};
use shop_etl::verify::VerifyReport;

pub fn run(project: &Project) -> Result<()> {
    let report = VerifyReport::collect(&project.paths)?;
    print!("{}", report);

    if !report.is_complete() {
        bail!("Project is incomplete");
    }
    println!("All artifacts present.");
    Ok(())
}
