use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

fn clusterseed(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("clusterseed").unwrap();
    cmd.env("CLUSTERSEED_HOME", home.path())
        .env_remove("CLUSTERSEED_ROUTER_URI")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn plan_uses_the_default_cluster_without_a_manifest() {
    let home = TempDir::new().unwrap();

    clusterseed(&home)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains(" 1. localhost:27018 -> replSetInitiate"))
        .stdout(predicate::str::contains("\"configsvr\": true"))
        .stdout(predicate::str::contains(" 2. localhost:27019 -> replSetInitiate"))
        .stdout(predicate::str::contains(" 3. localhost:27020 -> replSetInitiate"))
        .stdout(predicate::str::contains(
            " 4. mongodb://localhost:27017 -> addShard \"shard1ReplSet/shard1:27019\"",
        ))
        .stdout(predicate::str::contains(
            " 5. mongodb://localhost:27017 -> addShard \"shard2ReplSet/shard2:27020\"",
        ))
        .stdout(predicate::function(|out: &str| {
            out.matches("names replica set 'shard1ReplSet'").count() == 1
        }))
        .stderr(predicate::str::contains("shard1ReplSet").not());
}

#[test]
fn init_writes_manifest_and_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    let manifest = home.child("topology.toml");

    clusterseed(&home).arg("init").assert().success();
    manifest.assert(predicate::path::exists());
    manifest.assert(predicate::str::contains("configReplSet"));
    manifest.assert(predicate::str::contains("shard2ReplSet/shard2:27020"));

    clusterseed(&home)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    clusterseed(&home).args(["init", "--force"]).assert().success();
}

#[test]
fn dry_run_prints_the_plan_without_connecting() {
    let home = TempDir::new().unwrap();

    // An unroutable router would make a real run fail; a dry run never gets there
    clusterseed(&home)
        .args(["apply", "--dry-run", "--router", "mongodb://192.0.2.1:27017"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains(
            "mongodb://192.0.2.1:27017 -> addShard \"shard1ReplSet/shard1:27019\"",
        ));
}

#[test]
fn explicit_manifest_must_exist() {
    let home = TempDir::new().unwrap();

    clusterseed(&home)
        .args(["plan", "--topology"])
        .arg(home.child("missing.toml").path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Topology file not found"));
}

#[test]
fn invalid_manifest_is_rejected_before_planning() {
    let home = TempDir::new().unwrap();
    let manifest = home.child("broken.toml");
    manifest
        .write_str(
            r#"
[[replica_sets]]
id = "rs0"
members = [{ id = 0, host = "a:1" }]

[[replica_sets]]
id = "rs0"
members = [{ id = 0, host = "b:2" }]
"#,
        )
        .unwrap();

    clusterseed(&home)
        .args(["plan", "--topology"])
        .arg(manifest.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("defined more than once"));
}

#[test]
fn custom_manifest_is_planned_in_order() {
    let home = TempDir::new().unwrap();
    let manifest = home.child("custom.toml");
    manifest
        .write_str(
            r#"
[router]
uri = "mongodb://mongos:27017"

[[replica_sets]]
id = "rs0"
connect = "rs0-b:27018"
members = [{ id = 0, host = "rs0-a:27018" }, { id = 1, host = "rs0-b:27018" }]

[[shards]]
seed = "rs0/rs0-a:27018,rs0-b:27018"
"#,
        )
        .unwrap();

    clusterseed(&home)
        .args(["plan", "--topology"])
        .arg(manifest.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(" 1. rs0-b:27018 -> replSetInitiate"))
        .stdout(predicate::str::contains(
            " 2. mongodb://mongos:27017 -> addShard \"rs0/rs0-a:27018,rs0-b:27018\"",
        ))
        .stdout(predicate::str::contains(" 3.").not());
}

#[test]
fn settings_round_trip_and_feed_the_router() {
    let home = TempDir::new().unwrap();

    clusterseed(&home)
        .args(["config", "router_uri", "mongodb://mongos:27017"])
        .assert()
        .success();
    home.child("config.toml")
        .assert(predicate::str::contains("mongodb://mongos:27017"));

    clusterseed(&home)
        .args(["config", "router_uri"])
        .assert()
        .success()
        .stdout("mongodb://mongos:27017\n");

    clusterseed(&home)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("mongodb://mongos:27017 -> addShard"));

    clusterseed(&home)
        .args(["config", "router_url", "mongodb://typo:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid setting 'router_url'"));
}

#[test]
fn router_environment_override_wins_over_settings() {
    let home = TempDir::new().unwrap();
    home.child("config.toml")
        .write_str("router_uri = \"mongodb://from-file:27017\"\n")
        .unwrap();

    clusterseed(&home)
        .env("CLUSTERSEED_ROUTER_URI", "mongodb://from-env:27017")
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("mongodb://from-env:27017 -> addShard"))
        .stdout(predicate::str::contains("from-file").not());
}

#[test]
fn unset_setting_is_an_error() {
    let home = TempDir::new().unwrap();

    clusterseed(&home)
        .args(["config", "topology"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not set"));
}

#[test]
fn apply_names_the_failing_step_when_a_member_is_down() {
    let home = TempDir::new().unwrap();
    home.child("config.toml")
        .write_str("server_selection_timeout_secs = 1\n")
        .unwrap();

    clusterseed(&home)
        .args(["apply", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Step 'initiate config server replica set configReplSet' failed",
        ))
        .stderr(predicate::str::contains("Cannot reach localhost:27018"));
}

#[test]
fn verify_fails_when_the_cluster_is_down() {
    let home = TempDir::new().unwrap();
    home.child("config.toml")
        .write_str("server_selection_timeout_secs = 1\n")
        .unwrap();

    clusterseed(&home)
        .arg("verify")
        .assert()
        .failure()
        .stdout(predicate::str::contains("[FAIL] replica set configReplSet initiated"))
        .stdout(predicate::str::contains("[FAIL] router shards"))
        .stderr(predicate::str::contains("4 of 4 checks failed"));
}

#[test]
fn broken_settings_can_be_repaired_with_config() {
    let home = TempDir::new().unwrap();
    home.child("config.toml")
        .write_str("server_selection_timeout_secs = 0\n")
        .unwrap();

    clusterseed(&home)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be greater than zero"));

    clusterseed(&home)
        .args(["config", "server_selection_timeout_secs", "5"])
        .assert()
        .success();

    clusterseed(&home).arg("plan").assert().success();
}

#[test]
fn numeric_router_uri_is_stored_as_text() {
    let home = TempDir::new().unwrap();

    clusterseed(&home)
        .args(["config", "router_uri", "27017"])
        .assert()
        .success();

    clusterseed(&home)
        .args(["config", "router_uri"])
        .assert()
        .success()
        .stdout("27017\n");
}
