//! Test Record Client
//!
//! Generates sample connection records and posts them to a running
//! detection server for end-to-end testing.
//!
//! Usage: test-client [server_url] [count] [attack_rate] [delay_ms]

use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Connection record generator for testing
struct RecordGenerator {
    rng: rand::rngs::ThreadRng,
}

impl RecordGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a benign-looking connection record
    fn generate_normal(&mut self) -> Value {
        let count = self.rng.gen_range(1..20);
        json!({
            "duration": self.rng.gen_range(0..5),
            "protocol_type": self.random_choice(&["tcp", "udp"]),
            "service": self.random_choice(&["http", "smtp", "ftp"]),
            "flag": "SF",
            "src_bytes": self.rng.gen_range(100..2000),
            "dst_bytes": self.rng.gen_range(100..6000),
            "land": 0,
            "wrong_fragment": 0,
            "urgent": 0,
            "hot": 0,
            "num_failed_logins": 0,
            "logged_in": 1,
            "num_compromised": 0,
            "root_shell": 0,
            "su_attempted": 0,
            "num_root": 0,
            "num_file_creations": 0,
            "num_shells": 0,
            "num_access_files": 0,
            "num_outbound_cmds": 0,
            "is_host_login": 0,
            "is_guest_login": 0,
            "count": count,
            "srv_count": count,
            "serror_rate": 0.0,
            "srv_serror_rate": 0.0,
            "rerror_rate": 0.0,
            "srv_rerror_rate": 0.0,
            "same_srv_rate": 1.0,
            "diff_srv_rate": 0.0,
            "srv_diff_host_rate": 0.0,
            "dst_host_count": self.rng.gen_range(10..256),
            "dst_host_srv_count": self.rng.gen_range(10..256),
            "dst_host_same_srv_rate": 1.0,
            "dst_host_diff_srv_rate": 0.0,
            "dst_host_same_src_port_rate": self.rng.gen_range(0.0..0.2),
            "dst_host_srv_diff_host_rate": 0.0,
            "dst_host_serror_rate": 0.0,
            "dst_host_srv_serror_rate": 0.0,
            "dst_host_rerror_rate": 0.0,
            "dst_host_srv_rerror_rate": 0.0,
        })
    }

    /// Generate a flood-shaped record: half-open connections hammering one
    /// service, never logged in
    fn generate_attack(&mut self) -> Value {
        let count = self.rng.gen_range(200..512);
        json!({
            "duration": 0,
            "protocol_type": "tcp",
            "service": self.random_choice(&["private", "http", "telnet"]),
            "flag": self.random_choice(&["S0", "REJ"]),
            "src_bytes": 0,
            "dst_bytes": 0,
            "land": 0,
            "wrong_fragment": 0,
            "urgent": 0,
            "hot": 0,
            "num_failed_logins": 0,
            "logged_in": 0,
            "num_compromised": 0,
            "root_shell": 0,
            "su_attempted": 0,
            "num_root": 0,
            "num_file_creations": 0,
            "num_shells": 0,
            "num_access_files": 0,
            "num_outbound_cmds": 0,
            "is_host_login": 0,
            "is_guest_login": 0,
            "count": count,
            "srv_count": count,
            "serror_rate": 1.0,
            "srv_serror_rate": 1.0,
            "rerror_rate": 0.0,
            "srv_rerror_rate": 0.0,
            "same_srv_rate": self.rng.gen_range(0.0..0.1),
            "diff_srv_rate": self.rng.gen_range(0.5..1.0),
            "srv_diff_host_rate": 0.0,
            "dst_host_count": 255,
            "dst_host_srv_count": 255,
            "dst_host_same_srv_rate": self.rng.gen_range(0.0..0.1),
            "dst_host_diff_srv_rate": self.rng.gen_range(0.5..1.0),
            "dst_host_same_src_port_rate": 1.0,
            "dst_host_srv_diff_host_rate": 0.0,
            "dst_host_serror_rate": 1.0,
            "dst_host_srv_serror_rate": 1.0,
            "dst_host_rerror_rate": 0.0,
            "dst_host_srv_rerror_rate": 0.0,
        })
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Record Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let server_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:5000".to_string());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let attack_rate: f64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.2);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(250);

    info!(
        server_url = %server_url,
        count = count,
        attack_rate = attack_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::new();

    // Check the server first; fall back to dry-run mode when unreachable
    match client.get(format!("{}/health", server_url)).send().await {
        Ok(response) if response.status().is_success() => {
            info!("Connected to detection server at {}", server_url);
        }
        Ok(response) => {
            warn!(status = %response.status(), "Server is unhealthy. Running in dry-run mode.");
            return run_dry_mode(count, attack_rate, delay_ms).await;
        }
        Err(e) => {
            warn!(error = %e, "Cannot reach server. Running in dry-run mode.");
            return run_dry_mode(count, attack_rate, delay_ms).await;
        }
    }

    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    let mut normal_count = 0u64;
    let mut attack_count = 0u64;
    let mut flagged = 0u64;

    for i in 0..count {
        let record = if rng.gen_bool(attack_rate) {
            attack_count += 1;
            generator.generate_attack()
        } else {
            normal_count += 1;
            generator.generate_normal()
        };

        let response = client
            .post(format!("{}/predict", server_url))
            .json(&record)
            .send()
            .await?;

        if response.status().is_success() {
            let result: Value = response.json().await?;
            if result["is_attack"].as_bool().unwrap_or(false) {
                flagged += 1;
            }
        } else {
            let status = response.status();
            let body: Value = response.json().await.unwrap_or_else(|_| json!({}));
            warn!(status = %status, error = %body["error"], "Prediction request rejected");
        }

        // Log progress every 10 records
        if (i + 1) % 10 == 0 {
            info!(
                "Sent {}/{} records ({} normal, {} attack-shaped, {} flagged)",
                i + 1,
                count,
                normal_count,
                attack_count,
                flagged
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Sent {} records ({} normal, {} attack-shaped); server flagged {}",
        count, normal_count, attack_count, flagged
    );

    Ok(())
}

/// Print generated records without a server connection
async fn run_dry_mode(count: u64, attack_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    let mut generator = RecordGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let (kind, record) = if rng.gen_bool(attack_rate) {
            ("attack-shaped", generator.generate_attack())
        } else {
            ("normal", generator.generate_normal())
        };

        if i == 0 {
            info!("Sample record:\n{}", serde_json::to_string_pretty(&record)?);
        }
        info!("Generated {} record {}/{}", kind, i + 1, count);

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
