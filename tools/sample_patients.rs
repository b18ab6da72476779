//! Sample Patient Producer
//!
//! Prints random patient records as JSON lines for exercising the pipeline:
//!
//! `sample-patients [count] [at_risk_rate] [zero_field_rate] | cardio-risk-pipeline`

use rand::Rng;
use serde::Serialize;
use std::io::{self, Write};
use tracing::info;

/// Record layout accepted by the pipeline's consumer
#[derive(Debug, Clone, Serialize)]
struct PatientRecord {
    id: String,
    age: u32,
    gender: &'static str,
    height_cm: u32,
    weight_kg: u32,
    systolic_bp: u32,
    diastolic_bp: u32,
    cholesterol: &'static str,
    glucose: &'static str,
    smoker: &'static str,
    drinks_alcohol: &'static str,
    physically_active: &'static str,
}

/// Patient generator for testing
struct PatientGenerator {
    rng: rand::rngs::ThreadRng,
    patient_counter: u64,
}

impl PatientGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            patient_counter: 0,
        }
    }

    /// Generate a patient with unremarkable measurements
    fn generate_healthy(&mut self) -> PatientRecord {
        self.patient_counter += 1;

        PatientRecord {
            id: format!("patient_{:08}", self.patient_counter),
            age: self.rng.gen_range(25..55),
            gender: self.random_choice(&["Male", "Female"]),
            height_cm: self.rng.gen_range(155..195),
            weight_kg: self.rng.gen_range(50..85),
            systolic_bp: self.rng.gen_range(100..130),
            diastolic_bp: self.rng.gen_range(65..85),
            cholesterol: "Normal",
            glucose: "Normal",
            smoker: self.yes_no(0.1),
            drinks_alcohol: self.yes_no(0.2),
            physically_active: self.yes_no(0.8),
        }
    }

    /// Generate a patient with several cardiovascular risk factors
    fn generate_at_risk(&mut self) -> PatientRecord {
        self.patient_counter += 1;

        PatientRecord {
            id: format!("patient_{:08}", self.patient_counter),
            age: self.rng.gen_range(50..80),
            gender: self.random_choice(&["Male", "Female"]),
            height_cm: self.rng.gen_range(150..185),
            weight_kg: self.rng.gen_range(85..140),
            systolic_bp: self.rng.gen_range(140..190),
            diastolic_bp: self.rng.gen_range(90..120),
            cholesterol: self.random_choice(&["AboveNormal", "High"]),
            glucose: self.random_choice(&["Normal", "AboveNormal", "High"]),
            smoker: self.yes_no(0.5),
            drinks_alcohol: self.yes_no(0.4),
            physically_active: self.yes_no(0.2),
        }
    }

    /// Blank out one required field the way an untouched form input would
    fn zero_random_field(&mut self, record: &mut PatientRecord) {
        match self.rng.gen_range(0..5) {
            0 => record.age = 0,
            1 => record.height_cm = 0,
            2 => record.weight_kg = 0,
            3 => record.systolic_bp = 0,
            _ => record.diastolic_bp = 0,
        }
    }

    fn yes_no(&mut self, p_yes: f64) -> &'static str {
        if self.rng.gen_bool(p_yes) {
            "Yes"
        } else {
            "No"
        }
    }

    fn random_choice(&mut self, choices: &[&'static str]) -> &'static str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the record stream
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_patients=info".parse()?),
        )
        .with_writer(io::stderr)
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let count: u64 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(100);
    let at_risk_rate: f64 = args
        .get(2)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.3_f64)
        .clamp(0.0, 1.0);
    let zero_field_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.05_f64)
        .clamp(0.0, 1.0);

    info!(
        count = count,
        at_risk_rate = at_risk_rate,
        zero_field_rate = zero_field_rate,
        "Generating sample patients"
    );

    let mut generator = PatientGenerator::new();
    let mut rng = rand::thread_rng();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut healthy_count = 0;
    let mut at_risk_count = 0;
    let mut incomplete_count = 0;

    for _ in 0..count {
        let mut record = if rng.gen_bool(at_risk_rate) {
            at_risk_count += 1;
            generator.generate_at_risk()
        } else {
            healthy_count += 1;
            generator.generate_healthy()
        };

        if rng.gen_bool(zero_field_rate) {
            incomplete_count += 1;
            generator.zero_random_field(&mut record);
        }

        serde_json::to_writer(&mut out, &record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(
        "Completed! Generated {} patients ({} healthy, {} at risk, {} incomplete)",
        count, healthy_count, at_risk_count, incomplete_count
    );

    Ok(())
}
