use std::fs;

use anyhow::{Context, Result};

use super::types::{Flavor, NormalizedConfig};
use super::StepOutput;
use crate::xcode::Pbxproj;

/// flutter テンプレートの Runner ターゲット ID。
///
/// flutter create が生成する Runner.xcodeproj のオブジェクト ID は
/// テンプレート由来で全プロジェクト共通。
const RUNNER_TARGET_ID: &str = "97C146ED1CF9000F007C117D";

/// iOS プロジェクトにフレーバー別の設定を作成する。
///
/// フレーバーごとに `.xcconfig` と共有 `.xcscheme` を書き出し、
/// `project.pbxproj` に構成を登録する。
pub(super) fn create_ios_configs(ncfg: &NormalizedConfig) -> Result<StepOutput> {
    let ios_dir = ncfg.output_dir.join("ios");
    if !ios_dir.is_dir() {
        anyhow::bail!("ios ディレクトリが見つかりません: {}", ios_dir.display());
    }

    let mut files = Vec::new();

    // 1. フレーバー別 .xcconfig
    let flutter_dir = ios_dir.join("Flutter");
    for flavor in &ncfg.firebase.flavors {
        let path = flutter_dir.join(format!("{}.xcconfig", flavor.name));
        fs::write(&path, xcconfig_source(ncfg, flavor))
            .with_context(|| format!("xcconfig の書き込みに失敗: {}", path.display()))?;
        files.push(path);
    }

    // 2. project.pbxproj へ構成を登録
    let pbxproj_path = ios_dir.join("Runner.xcodeproj").join("project.pbxproj");
    let content = fs::read_to_string(&pbxproj_path)
        .with_context(|| format!("pbxproj の読み込みに失敗: {}", pbxproj_path.display()))?;
    let mut proj = Pbxproj::parse(&content)?;

    for flavor in &ncfg.firebase.flavors {
        let file_name = format!("{}.xcconfig", flavor.name);
        let ref_id =
            proj.add_xcconfig_reference(&file_name, &format!("Flutter/{file_name}"))?;
        proj.add_to_group("Flutter", &ref_id, &file_name)?;
        proj.add_flavor(&flavor.name, &ref_id, &file_name)?;
    }

    fs::write(&pbxproj_path, proj.serialize())
        .with_context(|| format!("pbxproj の書き込みに失敗: {}", pbxproj_path.display()))?;
    files.push(pbxproj_path);

    // 3. 共有スキーム
    let schemes_dir = ios_dir
        .join("Runner.xcodeproj")
        .join("xcshareddata")
        .join("xcschemes");
    fs::create_dir_all(&schemes_dir)
        .with_context(|| format!("スキームディレクトリの作成に失敗: {}", schemes_dir.display()))?;
    for flavor in &ncfg.firebase.flavors {
        let path = schemes_dir.join(format!("{}.xcscheme", flavor.name));
        fs::write(&path, xcscheme_source(&flavor.name))
            .with_context(|| format!("xcscheme の書き込みに失敗: {}", path.display()))?;
        files.push(path);
    }

    let notes = vec![
        "Xcode で Runner の署名設定 (Signing & Capabilities) を行ってください。".to_string(),
    ];

    Ok(StepOutput { files, notes })
}

/// フレーバー別 `.xcconfig` の内容。
fn xcconfig_source(ncfg: &NormalizedConfig, flavor: &Flavor) -> String {
    format!(
        "#include? \"Generated.xcconfig\"\n\
         \n\
         FLAVOR_NAME={}\n\
         PRODUCT_BUNDLE_IDENTIFIER={}\n\
         APP_DISPLAY_NAME={}\n",
        flavor.name,
        ncfg.flavored_bundle_id(flavor),
        ncfg.flavored_app_name(flavor),
    )
}

/// フレーバー別の共有スキーム XML。
///
/// Run / Test は Debug-{flavor}、Profile は Profile-{flavor}、
/// Archive は Release-{flavor} を使う。
fn xcscheme_source(flavor_name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Scheme
   LastUpgradeVersion = "1510"
   version = "1.3">
   <BuildAction
      parallelizeBuildables = "YES"
      buildImplicitDependencies = "YES">
      <BuildActionEntries>
         <BuildActionEntry
            buildForTesting = "YES"
            buildForRunning = "YES"
            buildForProfiling = "YES"
            buildForArchiving = "YES"
            buildForAnalyzing = "YES">
            <BuildableReference
               BuildableIdentifier = "primary"
               BlueprintIdentifier = "{runner_id}"
               BuildableName = "Runner.app"
               BlueprintName = "Runner"
               ReferencedContainer = "container:Runner.xcodeproj">
            </BuildableReference>
         </BuildActionEntry>
      </BuildActionEntries>
   </BuildAction>
   <TestAction
      buildConfiguration = "Debug-{flavor}"
      selectedDebuggerIdentifier = "Xcode.DebuggerFoundation.Debugger.LLDB"
      selectedLauncherIdentifier = "Xcode.DebuggerFoundation.Launcher.LLDB"
      shouldUseLaunchSchemeArgsEnv = "YES">
   </TestAction>
   <LaunchAction
      buildConfiguration = "Debug-{flavor}"
      selectedDebuggerIdentifier = "Xcode.DebuggerFoundation.Debugger.LLDB"
      selectedLauncherIdentifier = "Xcode.DebuggerFoundation.Launcher.LLDB"
      launchStyle = "0"
      useCustomWorkingDirectory = "NO"
      ignoresPersistentStateOnLaunch = "NO"
      debugDocumentVersioning = "YES"
      debugServiceExtension = "internal"
      allowLocationSimulation = "YES">
      <BuildableProductRunnable
         runnableDebuggingMode = "0">
         <BuildableReference
            BuildableIdentifier = "primary"
            BlueprintIdentifier = "{runner_id}"
            BuildableName = "Runner.app"
            BlueprintName = "Runner"
            ReferencedContainer = "container:Runner.xcodeproj">
         </BuildableReference>
      </BuildableProductRunnable>
      <CommandLineArguments>
         <CommandLineArgument
            argument = "--flavor {flavor}"
            isEnabled = "NO">
         </CommandLineArgument>
      </CommandLineArguments>
   </LaunchAction>
   <ProfileAction
      buildConfiguration = "Profile-{flavor}"
      shouldUseLaunchSchemeArgsEnv = "YES"
      savedToolIdentifier = ""
      useCustomWorkingDirectory = "NO"
      debugDocumentVersioning = "YES">
   </ProfileAction>
   <AnalyzeAction
      buildConfiguration = "Debug-{flavor}">
   </AnalyzeAction>
   <ArchiveAction
      buildConfiguration = "Release-{flavor}"
      revealArchiveInOrganizer = "YES">
   </ArchiveAction>
</Scheme>
"#,
        runner_id = RUNNER_TARGET_ID,
        flavor = flavor_name,
    )
}
