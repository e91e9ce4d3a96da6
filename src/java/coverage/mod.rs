#[cfg(test)]
mod tests;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{ExecutionContext, default_main_bin};
use crate::process::run_command;
use crate::{JavaTestError, Result};

pub const REPORT_DIR: &str = "jacoco-report";
pub const REPORT_FILE: &str = "jacoco.xml";

/// Arguments of the `report_coverage` tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReportCoverageRequest {
    #[serde(default = "default_main_bin")]
    pub classfiles_dir: String,
    #[serde(default)]
    pub package_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCoverage {
    pub coverage_percentage: f64,
    pub lines_covered: u64,
    pub total_lines: u64,
}

impl ClassCoverage {
    #[inline]
    pub fn from_counter(missed: u64, covered: u64) -> Self {
        let total = missed + covered;
        let coverage_percentage = if total > 0 {
            round_hundredths((covered as f64 / total as f64) * 100.0)
        } else {
            0.0
        };

        Self {
            coverage_percentage,
            lines_covered: covered,
            total_lines: total,
        }
    }
}

/// Round to two decimals on the value's exact binary expansion, ties to even
fn round_hundredths(value: f64) -> f64 {
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Line coverage keyed by package, then class (JVM internal names)
pub type CoverageReport = BTreeMap<String, BTreeMap<String, ClassCoverage>>;

/// Class file directory narrowed to the package, if one is given
#[inline]
pub fn classfiles_path(ctx: &ExecutionContext, request: &ReportCoverageRequest) -> PathBuf {
    let classfiles = ctx.resolve(&request.classfiles_dir);
    if request.package_name.is_empty() {
        classfiles
    } else {
        classfiles.join(request.package_name.replace('.', "/"))
    }
}

#[inline]
pub fn report_args(ctx: &ExecutionContext, classfiles: &Path, xml_path: &Path) -> Vec<String> {
    vec![
        "-jar".to_string(),
        ctx.artifacts.jacoco_cli_jar().to_string_lossy().into_owned(),
        "report".to_string(),
        ctx.artifacts.jacoco_exec().to_string_lossy().into_owned(),
        "--classfiles".to_string(),
        classfiles.to_string_lossy().into_owned(),
        "--sourcefiles".to_string(),
        ".".to_string(),
        "--xml".to_string(),
        xml_path.to_string_lossy().into_owned(),
    ]
}

/// Render `jacoco.exec` into `<workspace>/jacoco-report/jacoco.xml` and
/// summarise its line counters.
#[inline]
pub async fn report_coverage(
    ctx: &ExecutionContext,
    request: &ReportCoverageRequest,
) -> Result<CoverageReport> {
    let classfiles = classfiles_path(ctx, request);
    let report_dir = ctx.workspace().join(REPORT_DIR);
    tokio::fs::create_dir_all(&report_dir).await?;
    let xml_path = report_dir.join(REPORT_FILE);

    run_command(&ctx.java, &report_args(ctx, &classfiles, &xml_path), ctx.timeout)
        .await?
        .into_success()?;

    let xml = tokio::fs::read_to_string(&xml_path).await.map_err(|e| {
        JavaTestError::Coverage(format!(
            "Failed to read report {}: {}",
            xml_path.display(),
            e
        ))
    })?;

    let report = parse_coverage_report(&xml)?;
    info!(
        "Coverage report covers {} packages ({})",
        report.len(),
        xml_path.display()
    );
    Ok(report)
}

fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| JavaTestError::Coverage(format!("Malformed attribute: {}", e)))?;

    attr.map(|a| {
        a.unescape_value()
            .map(|v| v.into_owned())
            .map_err(|e| JavaTestError::Coverage(format!("Malformed attribute value: {}", e)))
    })
    .transpose()
}

fn counter_value(element: &BytesStart<'_>, name: &[u8]) -> Result<u64> {
    let raw = attribute(element, name)?.unwrap_or_default();
    raw.parse::<u64>().map_err(|_| {
        JavaTestError::Coverage(format!(
            "Invalid counter value '{}' for {}",
            raw,
            String::from_utf8_lossy(name)
        ))
    })
}

/// Tracks where we are in the report while streaming it
#[derive(Default)]
struct ReportState {
    stack: Vec<Vec<u8>>,
    package: Option<String>,
    class: Option<String>,
    class_has_line_counter: bool,
    report: CoverageReport,
}

impl ReportState {
    fn parent(&self) -> Option<&[u8]> {
        self.stack.last().map(Vec::as_slice)
    }

    fn open(&mut self, element: &BytesStart<'_>) -> Result<()> {
        match element.name().as_ref() {
            b"package" => {
                let name = attribute(element, b"name")?.unwrap_or_default();
                self.report.entry(name.clone()).or_default();
                self.package = Some(name);
            }
            b"class" if self.parent() == Some(b"package".as_slice()) => {
                let name = attribute(element, b"name")?.unwrap_or_default();
                if let Some(package) = &self.package {
                    self.report
                        .entry(package.clone())
                        .or_default()
                        .insert(name.clone(), ClassCoverage::from_counter(0, 0));
                }
                self.class = Some(name);
                self.class_has_line_counter = false;
            }
            b"counter" if self.parent() == Some(b"class".as_slice()) => {
                self.class_counter(element)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn class_counter(&mut self, element: &BytesStart<'_>) -> Result<()> {
        if self.class_has_line_counter
            || attribute(element, b"type")?.as_deref() != Some("LINE")
        {
            return Ok(());
        }

        let missed = counter_value(element, b"missed")?;
        let covered = counter_value(element, b"covered")?;

        if let (Some(package), Some(class)) = (&self.package, &self.class) {
            self.report
                .entry(package.clone())
                .or_default()
                .insert(class.clone(), ClassCoverage::from_counter(missed, covered));
        }
        self.class_has_line_counter = true;
        Ok(())
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"class" => self.class = None,
            b"package" => self.package = None,
            _ => {}
        }
    }
}

/// Extract per-class line coverage from a JaCoCo XML report.
///
/// Only the `LINE` counter that is a direct child of each `class` element is
/// used; method-level counters are ignored.
#[inline]
pub fn parse_coverage_report(xml: &str) -> Result<CoverageReport> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = ReportState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                state.open(&element)?;
                state.stack.push(element.name().as_ref().to_vec());
            }
            Ok(Event::Empty(element)) => {
                state.open(&element)?;
                state.close(element.name().as_ref());
            }
            Ok(Event::End(element)) => {
                state.stack.pop();
                state.close(element.name().as_ref());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(JavaTestError::Coverage(format!(
                    "Invalid report XML at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
    }

    debug!("Parsed coverage for {} packages", state.report.len());
    Ok(state.report)
}
