use anyhow::{Context, Result};
use predictscore_viewer::data::student::{StudentProfile, LEVELS, YES_NO};

const STUDENTS: usize = 240;
const RESULTS_PATH: &str = "sample_results.csv";
const STUDENTS_PATH: &str = "sample_students.csv";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    fn pick<'a>(&mut self, options: &[&'a str]) -> &'a str {
        let idx = (self.next_f64() * options.len() as f64) as usize;
        options[idx.min(options.len() - 1)]
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn random_student(rng: &mut SimpleRng) -> StudentProfile {
    let mut p = StudentProfile::default();
    p.hours_studied = rng.gauss(19.0, 6.0).clamp(1.0, 44.0).round();
    p.attendance = rng.gauss(80.0, 11.0).clamp(40.0, 100.0).round();
    p.previous_scores = rng.gauss(75.0, 12.0).clamp(40.0, 100.0).round();
    p.tutoring_sessions = rng.gauss(1.5, 1.3).clamp(0.0, 8.0).round();
    p.parental_involvement = rng.pick(LEVELS).to_string();
    p.motivation_level = rng.pick(LEVELS).to_string();
    p.extracurricular_activities = rng.pick(YES_NO).to_string();
    p
}

/// A plausible predicted score: driven by study habits plus noise.
fn predicted_score(p: &StudentProfile, rng: &mut SimpleRng) -> f64 {
    let base = 38.0
        + 1.1 * p.hours_studied
        + 0.2 * p.attendance
        + 0.1 * p.previous_scores
        + 1.5 * p.tutoring_sessions;
    round2((base + rng.gauss(0.0, 5.0)).clamp(1.0, 100.0))
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let students: Vec<StudentProfile> = (0..STUDENTS).map(|_| random_student(&mut rng)).collect();

    // Already-scored results, for File → Open results
    let mut results = csv::Writer::from_path(RESULTS_PATH)
        .with_context(|| format!("Cannot create {RESULTS_PATH}"))?;
    results.write_record([
        "id",
        "score_100",
        "Hours_Studied",
        "Attendance",
        "Tutoring_Sessions",
        "Motivation_Level",
    ])?;
    for (i, p) in students.iter().enumerate() {
        let score = predicted_score(p, &mut rng);
        results.write_record([
            (i + 1).to_string(),
            score.to_string(),
            p.hours_studied.to_string(),
            p.attendance.to_string(),
            p.tutoring_sessions.to_string(),
            p.motivation_level.clone(),
        ])?;
    }
    results.flush()?;

    // Raw attributes, for File → Score student batch
    let mut raw = csv::Writer::from_path(STUDENTS_PATH)
        .with_context(|| format!("Cannot create {STUDENTS_PATH}"))?;
    for p in &students {
        raw.serialize(p)?;
    }
    raw.flush()?;

    println!("Wrote {STUDENTS} scored rows to {RESULTS_PATH} and {STUDENTS} students to {STUDENTS_PATH}");
    Ok(())
}
