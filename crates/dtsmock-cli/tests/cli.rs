//! Tests for the `dtsmock` command line.

use dtsmock_core::MockConfig;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn api_tree(root: &Path) {
    write(
        root,
        "@ohos.battery.d.ts",
        "declare namespace battery {\n  function level(): number;\n}\nexport default battery;\n",
    );
    write(
        root,
        "net/@ohos.net.http.d.ts",
        "declare namespace http {\n  interface Response { code: number; }\n  function request(url: string): Promise<Response>;\n}\nexport default http;\n",
    );
    write(
        root,
        "@system.vibrator.d.ts",
        "export default class Vibrator {\n  static vibrate(): void;\n}\n",
    );
    write(root, "node_modules/pkg/index.d.ts", "export declare const x: number;\n");
}

fn dtsmock() -> Command {
    Command::new(env!("CARGO_BIN_EXE_dtsmock"))
}

#[test]
fn generate_writes_layout_and_indexes() {
    let api = tempdir().unwrap();
    let out = tempdir().unwrap();
    api_tree(api.path());

    let result =
        dtsmock_cli::generate(api.path(), out.path(), MockConfig::default(), false).unwrap();
    assert!(result.failures.is_empty(), "{:?}", result.failures);
    assert_eq!(result.files.len(), 3);

    let battery = fs::read_to_string(out.path().join("napi/ohos_battery.js")).unwrap();
    assert!(battery.contains("export function mockBattery() {"));
    assert!(out.path().join("napi/net/ohos_net_http.js").exists());
    assert!(out.path().join("system_vibrator.js").exists());
    assert!(!out.path().join("napi/node_modules").exists());

    let napi_index = fs::read_to_string(out.path().join("napi/index.js")).unwrap();
    assert!(napi_index.contains("export function mockRequireNapiFun() {"));
    assert!(napi_index.contains("case 'battery':"));
    assert!(napi_index.contains("case 'net.http':"));

    let system_index = fs::read_to_string(out.path().join("index.js")).unwrap();
    assert!(system_index.contains("export function mockSystemPlugin() {"));
    assert!(system_index.contains("import { mockVibrator } from './system_vibrator';"));

    assert!(!out.path().join(dtsmock_cli::REPORT_FILE).exists());
}

#[test]
fn generate_writes_report_with_failures() {
    let api = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(api.path(), "@ohos.good.d.ts", "export function ok(): void;\n");
    write(api.path(), "@ohos.bad.d.ts", "export interface {\n");

    let result = dtsmock_cli::generate(api.path(), out.path(), MockConfig::default(), true).unwrap();
    assert_eq!(result.failures.len(), 1);

    let report = fs::read_to_string(out.path().join(dtsmock_cli::REPORT_FILE)).unwrap();
    let report: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(report["failures"][0]["path"], "@ohos.bad.d.ts");
    assert_eq!(report["generated"][0]["source"], "@ohos.good.d.ts");
    assert_eq!(report["generated"][0]["output"], "napi/ohos_good.js");
}

#[test]
fn generate_rejects_missing_api_dir() {
    let out = tempdir().unwrap();
    let missing = out.path().join("nope");
    let err = dtsmock_cli::generate(&missing, out.path(), MockConfig::default(), false)
        .unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn binary_generate_exits_nonzero_on_failure() {
    let api = tempdir().unwrap();
    let out = tempdir().unwrap();
    write(api.path(), "@ohos.bad.d.ts", "export interface {\n");

    let output = dtsmock()
        .arg("generate")
        .arg(api.path())
        .args(["-o", out.path().to_str().unwrap()])
        .output()
        .unwrap();

    assert!(!output.status.success(), "command should fail: {:?}", output);
    assert!(out.path().join("napi/index.js").exists());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 failures"), "stderr was:\n{stderr}");
}

#[test]
fn binary_generate_honors_config_file() {
    let api = tempdir().unwrap();
    let out = tempdir().unwrap();
    api_tree(api.path());
    let config = api.path().join("custom.toml");
    fs::write(&config, "exclude_dirs = [\"node_modules\", \"net\"]\n").unwrap();

    let status = dtsmock()
        .args(["--config", config.to_str().unwrap()])
        .arg("generate")
        .arg(api.path())
        .args(["-o", out.path().to_str().unwrap(), "--report"])
        .status()
        .unwrap();

    assert!(status.success(), "command failed");
    assert!(out.path().join("napi/ohos_battery.js").exists());
    assert!(!out.path().join("napi/net").exists());
    assert!(out.path().join("mock-report.json").exists());
}

#[test]
fn binary_inspect_prints_entity_tree() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("foo.d.ts");
    fs::write(&file, "export interface Foo { bar: string; }\n").unwrap();

    let output = dtsmock().arg("inspect").arg(&file).output().unwrap();

    assert!(output.status.success(), "command failed: {:?}", output);
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let first = &tree["entity"]["declarations"][0];
    assert_eq!(first["declaration"], "interface");
    assert_eq!(first["name"], "Foo");
}

#[test]
fn binary_inspect_reports_parse_errors() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("broken.d.ts");
    fs::write(&file, "export interface {\n").unwrap();

    let output = dtsmock().arg("inspect").arg(&file).output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to parse"), "stderr was:\n{stderr}");
}
