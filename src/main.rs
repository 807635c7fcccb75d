// Copyright (C) 2024  Johannes Kepler University Linz, Institute of Networks and Security
// Copyright (C) 2024  CDL Digidow <https://www.digidow.eu/>
//
// Licensed under the EUPL, Version 1.2 or – as soon they will be approved by
// the European Commission - subsequent versions of the EUPL (the "Licence").
// You may not use this work except in compliance with the Licence.
//
// You should have received a copy of the European Union Public License along
// with this program.  If not, you may obtain a copy of the Licence at:
// <https://joinup.ec.europa.eu/software/page/eupl>
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the Licence is distributed on an "AS IS" basis,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the Licence for the specific language governing permissions and
// limitations under the Licence.

use kdam::tqdm;
use pico_args::Arguments;
use prevmetrics::{ConfusionMatrix, Error, PrevalenceShift, Samples, ScoreSet};

type BoxResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const DEFAULT_PREVALENCES: [f64; 4] = [0.05, 0.1, 0.25, 0.5];

/// Everything that can be set on the command line
struct Options {
    data: String,
    action: String,
    positive: u8,
    delimiter: u8,
    threshold: Option<f64>,
    prevalence: Option<f64>,
    prevalences: Vec<f64>,
    rounds: usize,
    size: Option<usize>,
    seed: u64,
    json: bool,
}

fn parse_list(s: &str) -> std::result::Result<Vec<f64>, std::num::ParseFloatError> {
    s.split(',').map(|p| p.trim().parse()).collect()
}

impl Options {
    fn from_args(mut args: Arguments) -> BoxResult<Self> {
        let delimiter: char = args
            .opt_value_from_str("--delimiter")?
            .unwrap_or(',');
        if !delimiter.is_ascii() {
            return Err(format!("delimiter {delimiter:?} must be a single ASCII character").into());
        }

        let positive: u8 = args.opt_value_from_str("--positive")?.unwrap_or(1);
        if positive > 1 {
            return Err(format!("--positive must be 0 or 1, got {positive}").into());
        }

        let options = Self {
            data: args.value_from_str("--data")?,
            action: args
                .opt_value_from_str("--action")?
                .unwrap_or_else(|| "metrics".into()),
            positive,
            delimiter: delimiter as u8,
            threshold: args.opt_value_from_str("--threshold")?,
            prevalence: args.opt_value_from_str("--prevalence")?,
            prevalences: args
                .opt_value_from_fn("--prevalences", parse_list)?
                .unwrap_or_else(|| DEFAULT_PREVALENCES.to_vec()),
            rounds: args.opt_value_from_str("--rounds")?.unwrap_or(100),
            size: args.opt_value_from_str("--size")?,
            seed: args.opt_value_from_str("--seed")?.unwrap_or(0),
            json: args.contains("--json"),
        };

        let rest = args.finish();
        if !rest.is_empty() {
            log::warn!("Ignoring unknown arguments {rest:?}");
        }
        Ok(options)
    }

    /// Hard predictions, either from the prediction column or from scores at `--threshold`
    fn predictions(&self, data: &Samples) -> prevmetrics::Result<Vec<bool>> {
        match self.threshold {
            Some(threshold) => data.predictions_at(threshold),
            None => data.predictions(self.positive),
        }
    }

    fn score_set(&self, data: &Samples) -> prevmetrics::Result<ScoreSet> {
        ScoreSet::from_scores(&data.scores()?, &data.labels(self.positive))
    }
}

fn metrics(data: &Samples, opt: &Options) -> BoxResult<()> {
    let cm = ConfusionMatrix::from_bools(&data.labels(opt.positive), &opt.predictions(data)?)?;
    let report = cm.report();

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("metric;value");
    for (name, value) in report.rows() {
        println!("{name};{value}");
    }
    if let Some(prevalence) = opt.prevalence {
        println!("ppv@{prevalence};{}", cm.ppv_at_prevalence(prevalence)?);
        println!("npv@{prevalence};{}", cm.npv_at_prevalence(prevalence)?);
    }
    Ok(())
}

fn roc(data: &Samples, opt: &Options) -> BoxResult<()> {
    let curve = opt.score_set(data)?.roc()?;
    if opt.json {
        println!("{}", serde_json::to_string_pretty(&curve)?);
        return Ok(());
    }

    println!("threshold;fpr;tpr");
    for p in &curve.points {
        println!("{};{};{}", p.threshold, p.fpr, p.tpr);
    }
    println!("auc;{}", curve.auc);
    Ok(())
}

fn precision_recall(data: &Samples, opt: &Options) -> BoxResult<()> {
    let curve = opt.score_set(data)?.precision_recall()?;
    if opt.json {
        println!("{}", serde_json::to_string_pretty(&curve)?);
        return Ok(());
    }

    println!("threshold;precision;recall");
    for p in &curve.points {
        println!("{};{};{}", p.threshold, p.precision, p.recall);
    }
    println!("auc;{}", curve.auc);
    println!("average_precision;{}", curve.average_precision);
    Ok(())
}

fn best_threshold(data: &Samples, opt: &Options) -> BoxResult<()> {
    let set = opt.score_set(data)?;
    let (threshold, cm) = set
        .best_threshold()
        .ok_or_else(|| Error::InvalidInput("no scores".into()))?;

    println!("optimal_threshold_used;fp;fn;sensitivity;specificity");
    println!(
        "{threshold};{};{};{};{}",
        cm.fp,
        cm.fne,
        cm.sensitivity(),
        cm.specificity()
    );
    Ok(())
}

fn prevalence_shift(data: &Samples, opt: &Options) -> BoxResult<()> {
    let labels = data.labels(opt.positive);
    let predictions = opt.predictions(data)?;
    let shift = PrevalenceShift::new(
        &labels,
        &predictions,
        opt.rounds,
        opt.size.unwrap_or(data.len()),
    )?;

    let rows = shift.sweep(tqdm!(opt.prevalences.iter()), opt.seed)?;

    if opt.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("prevalence;sensitivity;specificity;ppv;lr+;lr-;undefined_lr+");
    for row in rows {
        println!(
            "{};{};{};{};{};{};{}",
            row.prevalence,
            row.sensitivity,
            row.specificity,
            row.ppv,
            row.positive_likelihood_ratio,
            row.negative_likelihood_ratio,
            row.undefined_lr_pos
        );
    }
    Ok(())
}

fn run() -> BoxResult<()> {
    let opt = Options::from_args(pico_args::Arguments::from_env())?;
    let data = Samples::from_path(&opt.data, opt.delimiter)?;

    match opt.action.as_str() {
        "metrics" => metrics(&data, &opt),
        "roc" => roc(&data, &opt),
        "pr" => precision_recall(&data, &opt),
        "best-threshold" => best_threshold(&data, &opt),
        "prevalence-shift" => prevalence_shift(&data, &opt),
        other => Err(format!(
            "unknown --action {other}, possible values: metrics, roc, pr, best-threshold, prevalence-shift"
        )
        .into()),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
