//! Settings files for MISO Sashimi plots.
//!
//! All per-sample lists (`bam_files`, `miso_files`, `mapped_reads`, `colors`, and
//! `sample_labels`) must list the samples in the same order.  This is not checked;
//! lists in different orders silently produce plots with wrong sample labels.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parser::SpliceType;

pub use crate::sashimi::error::Error;

mod error {
    use thiserror::Error;

    /// Error type for plot settings.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("could not write plot settings to {0}: {1}")]
        Write(String, #[source] std::io::Error),
        #[error("could not read plot settings from {0}: {1}")]
        Read(String, #[source] std::io::Error),
        #[error("invalid plot settings JSON: {0}")]
        Json(#[from] serde_json::Error),
    }
}

/// Settings of a Sashimi plot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    /// Directory with the BAM files.
    pub bam_prefix: String,
    /// Directory with the MISO output.
    pub miso_prefix: String,
    pub bam_files: Vec<String>,
    /// MISO output directories, each is suffixed with `/<splice_type>`.
    pub miso_files: Vec<String>,
    /// Number of mapped reads of each sample, used for RPKM normalization.
    pub mapped_reads: Vec<u64>,
    /// Hexadecimal read density color of each sample, e.g., `#55a868`.
    pub colors: Option<Vec<String>>,
    /// Splice type, `"SE"` or `"MXE"` in JSON.
    pub splice_type: SpliceType,
    /// Figure width in inches.
    pub fig_width: f64,
    /// Figure height in inches.
    pub fig_height: f64,
    pub intron_scale: f64,
    pub exon_scale: f64,
    /// Plot on log scale.
    pub logged: bool,
    pub font_size: f64,
    /// Maximum of the y-axis.
    pub ymax: f64,
    pub show_posteriors: bool,
    pub bar_posteriors: bool,
    pub number_junctions: bool,
    pub resolution: f64,
    pub posterior_bins: u32,
    pub gene_posterior_ratio: f64,
    /// Color of the Bayes factor distribution bars.
    pub bar_color: String,
    pub bf_thresholds: Vec<f64>,
    /// Sample names shown instead of the sample ids.
    pub sample_labels: Option<Vec<String>>,
    /// Draw minus-strand events from left to right.
    pub reverse_minus: bool,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            bam_prefix: String::new(),
            miso_prefix: String::new(),
            bam_files: Vec::new(),
            miso_files: Vec::new(),
            mapped_reads: Vec::new(),
            colors: None,
            splice_type: SpliceType::SkippedExon,
            fig_width: 7.0,
            fig_height: 5.0,
            intron_scale: 1.0,
            exon_scale: 1.0,
            logged: false,
            font_size: 6.0,
            ymax: 150.0,
            show_posteriors: true,
            bar_posteriors: true,
            number_junctions: true,
            resolution: 0.5,
            posterior_bins: 40,
            gene_posterior_ratio: 5.0,
            bar_color: "#4c72b0".to_string(),
            bf_thresholds: vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0],
            sample_labels: None,
            reverse_minus: false,
        }
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// `["a",\n\t"b"]`
fn quoted_list<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    plain_list(values.into_iter().map(|value| format!("\"{value}\"")))
}

fn plain_list<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: std::fmt::Display,
{
    let values = values
        .into_iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    format!("[{}]", values.join(",\n\t"))
}

/// `(0, 1, 2)`, with a trailing comma for one element.
fn tuple(values: &[f64]) -> String {
    let values = values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
    match values.len() {
        1 => format!("({},)", values[0]),
        _ => format!("({})", values.join(", ")),
    }
}

fn optional_list(key: &str, values: &Option<Vec<String>>) -> String {
    match values {
        Some(values) => format!("{} = {}", key, quoted_list(values)),
        None => String::new(),
    }
}

impl PlotSettings {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Read(path.display().to_string(), e))?;
        Self::from_json_str(&json)
    }

    /// Render the settings file.
    pub fn render(&self) -> String {
        let miso_files = self
            .miso_files
            .iter()
            .map(|file| format!("{}/{}", file, self.splice_type));

        format!(
            r#"
[data]
# directory where BAM files are
bam_prefix = {bam_prefix}
# directory where MISO output is
miso_prefix = {miso_prefix}

bam_files = {bam_files}
miso_files = {miso_files}

[plotting]
# Dimensions of figure to be plotted (in inches)
fig_width = {fig_width}
fig_height = {fig_height}
# Factor to scale down introns and exons by
intron_scale = {intron_scale}
exon_scale = {exon_scale}
# Whether to use a log scale or not when plotting
logged = {logged}
font_size = {font_size}

# Max y-axis
ymax = {ymax}

# Whether to plot posterior distributions inferred by MISO
show_posteriors = {show_posteriors}

# Whether to show posterior distributions as bar summaries
bar_posteriors = {bar_posteriors}

# Whether to plot the number of reads in each junction
number_junctions = {number_junctions}

resolution = {resolution}
posterior_bins = {posterior_bins}
gene_posterior_ratio = {gene_posterior_ratio}

# List of colors for read denisites of each sample
{colors}

# Number of mapped reads in each sample
# (Used to normalize the read density for RPKM calculation)
coverages = {coverages}

# Bar color for Bayes factor distribution
# plots (--plot-bf-dist)
# Paint them Seaborn "deep" palette blue
bar_color = "{bar_color}"

# Bayes factors thresholds to use for --plot-bf-dist
bf_thresholds = {bf_thresholds}

# Renamed sample ids
{sample_labels}

# Whether or not to reverse the minus strand events
reverse_minus = {reverse_minus}

"#,
            bam_prefix = self.bam_prefix,
            miso_prefix = self.miso_prefix,
            bam_files = quoted_list(&self.bam_files),
            miso_files = quoted_list(miso_files),
            fig_width = self.fig_width,
            fig_height = self.fig_height,
            intron_scale = self.intron_scale,
            exon_scale = self.exon_scale,
            logged = py_bool(self.logged),
            font_size = self.font_size,
            ymax = self.ymax,
            show_posteriors = py_bool(self.show_posteriors),
            bar_posteriors = py_bool(self.bar_posteriors),
            number_junctions = py_bool(self.number_junctions),
            resolution = self.resolution,
            posterior_bins = self.posterior_bins,
            gene_posterior_ratio = self.gene_posterior_ratio,
            colors = optional_list("colors", &self.colors),
            coverages = plain_list(&self.mapped_reads),
            bar_color = self.bar_color,
            bf_thresholds = tuple(&self.bf_thresholds),
            sample_labels = optional_list("sample_labels", &self.sample_labels),
            reverse_minus = py_bool(self.reverse_minus),
        )
    }
}

/// Write the settings file for the given plot settings.
pub fn write_sashimi_plot_settings<P: AsRef<Path>>(
    path: P,
    settings: &PlotSettings,
) -> Result<(), Error> {
    let path = path.as_ref();
    log::info!("Writing Sashimi plot settings to {}", path.display());
    std::fs::write(path, settings.render())
        .map_err(|e| Error::Write(path.display().to_string(), e))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn two_samples() -> PlotSettings {
        PlotSettings {
            bam_prefix: "/data/bams".to_string(),
            miso_prefix: "/data/miso".to_string(),
            bam_files: vec!["a.bam".to_string(), "b.bam".to_string()],
            miso_files: vec!["a".to_string(), "b".to_string()],
            mapped_reads: vec![1000, 2000],
            ..Default::default()
        }
    }

    #[test]
    fn helpers() {
        assert_eq!(py_bool(true), "True");
        assert_eq!(quoted_list(["a", "b"]), "[\"a\",\n\t\"b\"]");
        assert_eq!(quoted_list(Vec::<String>::new()), "[]");
        assert_eq!(plain_list([1, 2]), "[1,\n\t2]");
        assert_eq!(tuple(&[0.0, 1.0, 2.5]), "(0, 1, 2.5)");
        assert_eq!(tuple(&[3.0]), "(3,)");
        assert_eq!(tuple(&[]), "()");
    }

    #[test]
    fn render_without_colors() {
        let rendered = two_samples().render();

        assert!(rendered
            .starts_with("\n[data]\n# directory where BAM files are\nbam_prefix = /data/bams\n"));
        assert!(rendered.contains("bam_files = [\"a.bam\",\n\t\"b.bam\"]\n"));
        assert!(rendered.contains("miso_files = [\"a/SE\",\n\t\"b/SE\"]\n"));
        assert!(rendered.contains("# List of colors for read denisites of each sample\n\n\n"));
        assert!(rendered.contains("# Renamed sample ids\n\n\n"));
        assert!(rendered.contains("coverages = [1000,\n\t2000]\n"));
        assert!(rendered.contains("fig_width = 7\nfig_height = 5\n"));
        assert!(rendered.contains("logged = False\nfont_size = 6\n"));
        assert!(rendered
            .contains("resolution = 0.5\nposterior_bins = 40\ngene_posterior_ratio = 5\n"));
        assert!(rendered.contains("show_posteriors = True\n"));
        assert!(rendered.contains("bar_color = \"#4c72b0\"\n"));
        assert!(rendered.contains("bf_thresholds = (0, 1, 2, 5, 10, 20)\n"));
        assert!(rendered.ends_with("reverse_minus = False\n\n"));
    }

    #[test]
    fn render_with_colors_and_labels() {
        let settings = PlotSettings {
            colors: Some(vec!["#a".to_string(), "#b".to_string()]),
            sample_labels: Some(vec!["first".to_string(), "second".to_string()]),
            splice_type: SpliceType::MutuallyExclusiveExon,
            logged: true,
            ..two_samples()
        };
        let rendered = settings.render();

        assert!(rendered.contains("\ncolors = [\"#a\",\n\t\"#b\"]\n"));
        assert!(rendered.contains("\nsample_labels = [\"first\",\n\t\"second\"]\n"));
        assert!(rendered.contains("miso_files = [\"a/MXE\",\n\t\"b/MXE\"]\n"));
        assert!(rendered.contains("logged = True\n"));
    }

    #[test]
    fn json_defaults() -> Result<(), Error> {
        let settings = PlotSettings::from_json_str(
            r##"{
                "bam_prefix": "/data/bams",
                "bam_files": ["a.bam"],
                "colors": ["#55a868"],
                "ymax": 75
            }"##,
        )?;

        assert_eq!(settings.bam_prefix, "/data/bams");
        assert_eq!(settings.colors, Some(vec!["#55a868".to_string()]));
        assert_eq!(settings.ymax, 75.0);
        assert_eq!(settings.fig_width, 7.0);
        assert_eq!(settings.splice_type, SpliceType::SkippedExon);
        assert_eq!(settings.sample_labels, None);

        let settings = PlotSettings::from_json_str(r#"{"splice_type": "MXE"}"#)?;
        assert_eq!(settings.splice_type, SpliceType::MutuallyExclusiveExon);
        assert!(matches!(
            PlotSettings::from_json_str(r#"{"splice_type": "RI"}"#),
            Err(Error::Json(_))
        ));

        assert!(matches!(
            PlotSettings::from_json_str("{\"ymax\": \"high\"}"),
            Err(Error::Json(_))
        ));

        Ok(())
    }

    #[test]
    fn write_file() -> Result<(), anyhow::Error> {
        let tmp_dir = tempfile::tempdir()?;
        let path = tmp_dir.path().join("sashimi_plot_settings.txt");
        let settings = two_samples();
        write_sashimi_plot_settings(&path, &settings)?;

        assert_eq!(std::fs::read_to_string(&path)?, settings.render());
        assert!(matches!(
            write_sashimi_plot_settings(tmp_dir.path().join("missing/file.txt"), &settings),
            Err(Error::Write(..))
        ));

        Ok(())
    }
}
