/* This is part of nodegyp-offline - which is under the MIT License ***********/

use log::*;

use crate::archive;
use crate::download::Fetcher;
use crate::error::{Error, Result};
use crate::interrupt::Interrupt;
use crate::layout::{InstallPlan, PackageInstall};
use crate::npm;
use crate::resolve::BuildTarget;
use crate::util;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Layout,
    Directory,
    Download,
    Copy,
    Packages,
    Extraction,
    File,
    Script,
    Archive,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Layout => "layout",
            Step::Directory => "directory",
            Step::Download => "download",
            Step::Copy => "copy",
            Step::Packages => "npm install",
            Step::Extraction => "extraction",
            Step::File => "file",
            Step::Script => "installer script",
            Step::Archive => "archive",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub struct Failure {
    pub target: String,
    pub step: Step,
    pub error: Error,
}

/// Failed steps of a whole run. A bundle with failed steps is incomplete.
#[derive(Debug, Default)]
pub struct Report {
    failures: Vec<Failure>,
}

impl Report {
    /// Keep track of the outcome of a step. Returns whether it succeeded.
    pub fn record(&mut self, target: &BuildTarget, step: Step, result: Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                error!("[{}] {} failed: {}", target, step, err);
                self.failures.push(Failure {
                    target: target.to_string(),
                    step: step,
                    error: err,
                });
                false
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    #[cfg(test)]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn log_summary(&self) {
        if self.is_complete() {
            info!("All bundles are complete");
            return;
        }
        error!("{} step(s) failed, the following bundles are INCOMPLETE:", self.failures.len());
        for failure in &self.failures {
            error!("  [{}] {}: {}", failure.target, failure.step, failure.error);
        }
    }
}

fn install_packages(packages: &PackageInstall) -> Result<()> {
    npm::install(&packages.program, &packages.prefix, &packages.packages)?;
    for path in &packages.removals {
        util::remove_path(path)?;
    }
    Ok(())
}

/// Produce the bundle described by plan. Failed steps are recorded in the
/// report and do not prevent the next steps from running, except when the
/// layout root itself cannot be created.
pub fn run(target: &BuildTarget, plan: &InstallPlan, fetcher: &mut dyn Fetcher,
           interrupt: &Interrupt, report: &mut Report) {
    info!("Assembling bundle for {} in {:#?}", target, plan.root);

    let created = {
        let _guard = interrupt.lock();
        util::recreate_dir(&plan.root)
    };
    if ! report.record(target, Step::Layout, created) {
        return;
    }
    for dir in &plan.directories {
        report.record(target, Step::Directory, util::create_dir(dir));
    }

    info!("1. download Node.js runtime, headers and libraries");
    for (idx, download) in plan.downloads.iter().enumerate() {
        info!("[{}/{}] {}", idx + 1, plan.downloads.len(), download.url);
        report.record(target, Step::Download, fetcher.fetch(&download.url, &download.path));
    }
    for copy in &plan.copies {
        report.record(target, Step::Copy, util::copy_file(&copy.from, &copy.to));
    }

    info!("2. install {}", plan.packages.packages.join(" "));
    report.record(target, Step::Packages, install_packages(&plan.packages));

    info!("3. lay out the build caches");
    for extraction in &plan.extractions {
        report.record(target, Step::Extraction, archive::extract(extraction));
    }
    for file in &plan.files {
        report.record(target, Step::File,
            util::write_text(&file.path, &file.contents, file.executable));
    }

    info!("4. create install script {:#?}", plan.script.path);
    report.record(target, Step::Script,
        util::write_text(&plan.script.path, &plan.script.contents, plan.script.executable));

    info!("5. pack archives");
    for op in &plan.archives {
        let _guard = interrupt.lock();
        report.record(target, Step::Archive, archive::create(op));
    }
}
