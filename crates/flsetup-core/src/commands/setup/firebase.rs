use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use super::types::{FirebaseFeature, Flavor, NormalizedConfig};
use super::StepOutput;
use crate::config::CliConfig;
use crate::retry::{run_with_retry, RetryConfig};

/// Firebase 連携を設定する。
///
/// フレーバーごとに `flutterfire configure` を実行して設定 Dart ファイルを
/// 生成し、あわせて `.firebaserc` / `firebase.json` とフレーバー別の
/// エントリポイントを書き出す。
pub(super) fn configure_firebase(
    ncfg: &NormalizedConfig,
    cli: &CliConfig,
) -> Result<StepOutput> {
    let mut files = Vec::new();
    let mut notes = Vec::new();

    let platforms_csv = ncfg
        .platforms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",");

    for flavor in &ncfg.firebase.flavors {
        let project = flavor
            .firebase_project
            .as_deref()
            .with_context(|| format!("フレーバー '{}' のプロジェクト ID が未解決", flavor.name))?;

        let out_file = format!("lib/firebase_options_{}.dart", flavor.name);
        let bundle_id = ncfg.flavored_bundle_id(flavor);
        let android_package = ncfg.flavored_android_package(flavor);

        let args: Vec<&str> = vec![
            "configure",
            "--yes",
            "--project",
            project,
            "--out",
            &out_file,
            "--platforms",
            &platforms_csv,
            "--ios-bundle-id",
            &bundle_id,
            "--android-package-name",
            &android_package,
        ];
        run_with_retry(
            &cli.flutterfire_bin,
            &args,
            &ncfg.output_dir,
            &RetryConfig::default(),
        )
        .map_err(anyhow::Error::msg)?;

        files.push(ncfg.output_dir.join(&out_file));
        files.push(write_flavor_entrypoint(ncfg, flavor)?);
        notes.push(format!(
            "Firebase コンソールで '{project}' の設定 (認証方式・ルール) を確認してください。"
        ));
    }

    files.push(write_firebaserc(ncfg)?);
    files.extend(write_firebase_json(ncfg)?);

    Ok(StepOutput { files, notes })
}

/// フレーバー別エントリポイント `lib/main_{flavor}.dart` を書き出す。
fn write_flavor_entrypoint(ncfg: &NormalizedConfig, flavor: &Flavor) -> Result<PathBuf> {
    let path = ncfg
        .output_dir
        .join(format!("lib/main_{}.dart", flavor.name));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, flavor_entrypoint_source(&flavor.name))
        .with_context(|| format!("エントリポイントの書き込みに失敗: {}", path.display()))?;
    Ok(path)
}

/// フレーバー別エントリポイントの Dart ソース。
fn flavor_entrypoint_source(flavor_name: &str) -> String {
    format!(
        r#"import 'package:firebase_core/firebase_core.dart';
import 'package:flutter/widgets.dart';

import 'firebase_options_{flavor_name}.dart';
import 'main.dart' as app;

Future<void> main() async {{
  WidgetsFlutterBinding.ensureInitialized();
  await Firebase.initializeApp(
    options: DefaultFirebaseOptions.currentPlatform,
  );
  app.main();
}}
"#
    )
}

/// `.firebaserc` を書き出す。
fn write_firebaserc(ncfg: &NormalizedConfig) -> Result<PathBuf> {
    let path = ncfg.output_dir.join(".firebaserc");
    let value = firebaserc_value(ncfg);
    fs::write(&path, format!("{}\n", serde_json::to_string_pretty(&value)?))
        .with_context(|| format!(".firebaserc の書き込みに失敗: {}", path.display()))?;
    Ok(path)
}

/// `.firebaserc` の内容。フレーバー名をプロジェクトエイリアスとして登録する。
fn firebaserc_value(ncfg: &NormalizedConfig) -> Value {
    let mut projects = serde_json::Map::new();

    let default_project = ncfg
        .firebase
        .default_project
        .clone()
        .or_else(|| {
            ncfg.firebase
                .flavors
                .first()
                .and_then(|f| f.firebase_project.clone())
        });
    if let Some(project) = default_project {
        projects.insert("default".to_string(), Value::String(project));
    }
    for flavor in &ncfg.firebase.flavors {
        if let Some(project) = &flavor.firebase_project {
            projects.insert(flavor.name.clone(), Value::String(project.clone()));
        }
    }

    json!({ "projects": projects })
}

/// `firebase.json` と関連ルールファイルを書き出す。
///
/// Firestore / Storage が選択されている場合のみ生成する。ルールは
/// 全拒否で初期化し、実際のルール設計は残作業として TODO.md に回る。
fn write_firebase_json(ncfg: &NormalizedConfig) -> Result<Vec<PathBuf>> {
    let Some(value) = firebase_json_value(ncfg) else {
        return Ok(Vec::new());
    };

    let mut files = Vec::new();

    let path = ncfg.output_dir.join("firebase.json");
    fs::write(&path, format!("{}\n", serde_json::to_string_pretty(&value)?))
        .with_context(|| format!("firebase.json の書き込みに失敗: {}", path.display()))?;
    files.push(path);

    if has_feature(ncfg, FirebaseFeature::Firestore) {
        let rules = ncfg.output_dir.join("firestore.rules");
        fs::write(&rules, FIRESTORE_RULES)?;
        files.push(rules);
    }
    if has_feature(ncfg, FirebaseFeature::Storage) {
        let rules = ncfg.output_dir.join("storage.rules");
        fs::write(&rules, STORAGE_RULES)?;
        files.push(rules);
    }

    Ok(files)
}

fn has_feature(ncfg: &NormalizedConfig, feature: FirebaseFeature) -> bool {
    ncfg.firebase.features.contains(&feature)
}

/// `firebase.json` の内容。対象機能が無ければ None。
fn firebase_json_value(ncfg: &NormalizedConfig) -> Option<Value> {
    let mut root = serde_json::Map::new();
    if has_feature(ncfg, FirebaseFeature::Firestore) {
        root.insert(
            "firestore".to_string(),
            json!({ "rules": "firestore.rules" }),
        );
    }
    if has_feature(ncfg, FirebaseFeature::Storage) {
        root.insert("storage".to_string(), json!({ "rules": "storage.rules" }));
    }
    (!root.is_empty()).then(|| Value::Object(root))
}

/// 初期状態は全拒否。
const FIRESTORE_RULES: &str = r"rules_version = '2';
service cloud.firestore {
  match /databases/{database}/documents {
    match /{document=**} {
      allow read, write: if false;
    }
  }
}
";

const STORAGE_RULES: &str = r"rules_version = '2';
service firebase.storage {
  match /b/{bucket}/o {
    match /{allPaths=**} {
      allow read, write: if false;
    }
  }
}
";
