//! Write a small synthetic dataset and model so the service can run locally.
//!
//! Usage: `generate_sample [OUT_DIR]` (default `.`). Produces
//! `data/kaggle_pivot_min_descending.{csv,parquet}`, `data/kaggle_sw_raw.csv`
//! and `model.json`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use cet_recommender::data::rng::Mt19937;
use cet_recommender::predict::ForestPredictor;
use cet_recommender::predict::encoder::{CategoricalColumn, ColumnEncoder, HandleUnknown};
use cet_recommender::predict::forest::{DecisionTree, TreeNode};

const COLLEGES: [(&str, f64); 6] = [
    ("Veermata Jijabai Technological Institute, Mumbai", 99.0),
    ("College of Engineering, Pune", 98.5),
    ("Walchand College of Engineering, Sangli", 95.0),
    ("Government College of Engineering, Nagpur", 93.0),
    ("Shri Guru Gobind Singhji Institute of Engineering, Nanded", 90.0),
    ("K. K. Wagh Institute of Engineering, Nashik", 85.0),
];

const BRANCHES: [(&str, f64); 5] = [
    ("Computer Engineering", 0.0),
    ("Information Technology", -1.5),
    ("Electronics and Telecommunication", -3.5),
    ("Mechanical Engineering", -8.0),
    ("Civil Engineering", -12.0),
];

const SEAT_TYPES: [(&str, f64, &str); 5] = [
    ("GOPENS", 0.0, "OPEN"),
    ("LOPENS", -0.8, "OPEN"),
    ("TFWS", 0.5, "OPEN"),
    ("GOBCS", -2.5, "OBC"),
    ("GSCS", -10.0, "SC"),
];

const SCORE_TYPES: [(&str, f64); 2] = [("MHT-CET", 0.0), ("JEE", -2.0)];

const EVENTS_PER_SEAT: usize = 4;

fn uniform(rng: &mut Mt19937, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.next_f64()
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

struct Cutoff {
    college: &'static str,
    branch: &'static str,
    seat_type: &'static str,
    score_type: &'static str,
    min: f64,
}

fn generate_cutoffs(rng: &mut Mt19937) -> Vec<Cutoff> {
    let mut rows = Vec::new();
    for &(college, base) in &COLLEGES {
        for &(branch, branch_offset) in &BRANCHES {
            for &(seat_type, seat_offset, _) in &SEAT_TYPES {
                for &(score_type, score_offset) in &SCORE_TYPES {
                    let jitter = uniform(rng, -0.5, 0.5);
                    let min = (base + branch_offset + seat_offset + score_offset + jitter)
                        .clamp(0.0, 100.0);
                    rows.push(Cutoff {
                        college,
                        branch,
                        seat_type,
                        score_type,
                        min: round2(min),
                    });
                }
            }
        }
    }
    rows.sort_by(|a, b| b.min.total_cmp(&a.min));
    rows
}

fn write_cutoffs_csv(path: &Path, rows: &[Cutoff]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating cutoff CSV")?;
    writer.write_record(["college_name", "branch", "seat_type", "score_type", "min"])?;
    for r in rows {
        let min = r.min.to_string();
        writer.write_record([r.college, r.branch, r.seat_type, r.score_type, min.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_cutoffs_parquet(path: &Path, rows: &[Cutoff]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("college_name", DataType::Utf8, false),
        Field::new("branch", DataType::Utf8, false),
        Field::new("seat_type", DataType::Utf8, false),
        Field::new("score_type", DataType::Utf8, false),
        Field::new("min", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.college))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.branch))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.seat_type))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.score_type))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.min))),
        ],
    )
    .context("building cutoff record batch")?;

    let file = std::fs::File::create(path).context("creating cutoff parquet")?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Historical events scattered above each MHT-CET cutoff.
fn write_history_csv(path: &Path, cutoffs: &[Cutoff], rng: &mut Mt19937) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path).context("creating historical CSV")?;
    writer.write_record([
        "college_name",
        "branch",
        "seat_type",
        "percentile",
        "rank",
        "category",
        "score_type",
        "gender",
    ])?;

    let mut count = 0;
    for c in cutoffs.iter().filter(|c| c.score_type == "MHT-CET") {
        let category = SEAT_TYPES
            .iter()
            .find(|(s, _, _)| *s == c.seat_type)
            .map_or("OPEN", |(_, _, cat)| *cat);
        for _ in 0..EVENTS_PER_SEAT {
            let percentile = round2(uniform(rng, c.min, 100.0_f64.min(c.min + 3.0)));
            let rank = ((100.0 - percentile) * 2500.0).round() as i64 + 1;
            let gender = if c.seat_type.starts_with('L') || rng.bounded(1) == 0 {
                "Female"
            } else {
                "Male"
            };
            let percentile = percentile.to_string();
            let rank = rank.to_string();
            writer.write_record([
                c.college,
                c.branch,
                c.seat_type,
                percentile.as_str(),
                rank.as_str(),
                category,
                c.score_type,
                gender,
            ])?;
            count += 1;
        }
    }
    writer.flush()?;
    Ok(count)
}

/// A one-tree forest that maps percentile bands onto colleges. It exercises
/// the artifact format; it is not a trained model.
fn synthetic_model() -> ForestPredictor {
    let categorical = vec![
        CategoricalColumn {
            feature: "branch".into(),
            categories: BRANCHES.iter().map(|(b, _)| b.to_string()).collect(),
        },
        CategoricalColumn {
            feature: "seat_type".into(),
            categories: SEAT_TYPES.iter().map(|(s, _, _)| s.to_string()).collect(),
        },
        CategoricalColumn {
            feature: "category".into(),
            categories: vec!["OBC".into(), "OPEN".into(), "SC".into()],
        },
        CategoricalColumn {
            feature: "score_type".into(),
            categories: SCORE_TYPES.iter().map(|(s, _)| s.to_string()).collect(),
        },
        CategoricalColumn {
            feature: "gender".into(),
            categories: vec!["Female".into(), "Male".into()],
        },
    ];
    let encoder = ColumnEncoder {
        categorical,
        numeric: vec!["percentile".into(), "rank".into()],
        handle_unknown: HandleUnknown::Ignore,
    };
    let percentile_col = encoder.width() - 2;

    let classes: Vec<String> = COLLEGES.iter().map(|(c, _)| c.to_string()).collect();
    // Colleges from lowest to highest base cutoff.
    let mut order: Vec<usize> = (0..COLLEGES.len()).collect();
    order.sort_by(|&a, &b| COLLEGES[a].1.total_cmp(&COLLEGES[b].1));

    let leaf = |class: usize| TreeNode::Leaf {
        value: (0..classes.len())
            .map(|i| if i == class { 1.0 } else { 0.0 })
            .collect(),
    };

    let mut nodes = Vec::new();
    for pair in order.windows(2) {
        let split_idx = nodes.len();
        nodes.push(TreeNode::Split {
            feature: percentile_col,
            threshold: (COLLEGES[pair[0]].1 + COLLEGES[pair[1]].1) / 2.0,
            left: split_idx + 1,
            right: split_idx + 2,
        });
        nodes.push(leaf(pair[0]));
    }
    if let Some(&top) = order.last() {
        nodes.push(leaf(top));
    }

    ForestPredictor {
        encoder,
        classes,
        trees: vec![DecisionTree { nodes }],
    }
}

fn main() -> Result<()> {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let out_dir = Path::new(&out_dir);
    let data_dir = out_dir.join("data");
    std::fs::create_dir_all(&data_dir).context("creating data directory")?;

    let mut rng = Mt19937::new(42);

    let cutoffs = generate_cutoffs(&mut rng);
    write_cutoffs_csv(&data_dir.join("kaggle_pivot_min_descending.csv"), &cutoffs)?;
    write_cutoffs_parquet(&data_dir.join("kaggle_pivot_min_descending.parquet"), &cutoffs)?;
    let events = write_history_csv(&data_dir.join("kaggle_sw_raw.csv"), &cutoffs, &mut rng)?;

    let model = synthetic_model();
    model.validate().context("synthetic model")?;
    let model_path = out_dir.join("model.json");
    std::fs::write(&model_path, serde_json::to_string_pretty(&model)?)
        .context("writing model.json")?;

    println!(
        "Wrote {} cutoff rows, {events} historical rows and {} to {}",
        cutoffs.len(),
        model_path.display(),
        out_dir.display()
    );
    Ok(())
}
