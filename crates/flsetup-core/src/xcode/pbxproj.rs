//! project.pbxproj の構造化エディタ。
//!
//! Xcode プロジェクトファイルは plist 由来の独自テキスト形式で、Xcode 自身が
//! `/* Begin XXX section */` ... `/* End XXX section */` のセクションマーカーを
//! 必ず出力する。このモジュールはそのマーカーを足場に行指向で解析し、
//! フレーバー対応に必要な 3 操作のみを型付きで提供する:
//!
//! 1. `.xcconfig` の `PBXFileReference` 追加
//! 2. グループ (`PBXGroup`) への参照追加
//! 3. フレーバー別 `XCBuildConfiguration` の複製と
//!    `XCConfigurationList` への登録
//!
//! 触れない行はそのまま保持して書き戻す。オブジェクト ID は論理名の
//! ハッシュから決定的に導出するため、再実行しても同じ ID になり冪等。

use sha2::{Digest, Sha256};
use thiserror::Error;

/// pbxproj 編集時のエラー。
#[derive(Debug, Error)]
pub enum PbxprojError {
    #[error("pbxproj のヘッダが不正です (UTF8 マーカーがありません)")]
    InvalidHeader,
    #[error("セクションが見つかりません: {0}")]
    MissingSection(&'static str),
    #[error("グループが見つかりません: {0}")]
    GroupNotFound(String),
    #[error("ビルド構成が見つかりません: {0}")]
    ConfigurationNotFound(String),
}

/// 複製元として扱うビルド構成名。
const BASE_CONFIGURATIONS: &[&str] = &["Debug", "Release", "Profile"];

/// 解析済みの pbxproj。
pub struct Pbxproj {
    lines: Vec<String>,
}

/// XCConfigurationList 1 件分の解析結果。
struct ConfigurationList {
    /// リストのオブジェクト ID
    id: String,
    /// buildConfigurations エントリ (ID, 構成名)
    configs: Vec<(String, String)>,
}

/// 次に追加すべきフレーバー構成。
struct PendingFlavorConfig {
    list_id: String,
    base_id: String,
    new_name: String,
}

impl Pbxproj {
    /// pbxproj テキストを解析する。
    pub fn parse(content: &str) -> Result<Self, PbxprojError> {
        if !content.starts_with("// !$*UTF8*$!") {
            return Err(PbxprojError::InvalidHeader);
        }
        Ok(Self {
            lines: content.lines().map(ToString::to_string).collect(),
        })
    }

    /// テキストに書き戻す。
    pub fn serialize(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// 論理名から 24 桁 16 進のオブジェクト ID を決定的に導出する。
    fn object_id(seed: &str) -> String {
        let digest = Sha256::digest(seed.as_bytes());
        digest
            .iter()
            .take(12)
            .map(|b| format!("{b:02X}"))
            .collect()
    }

    /// セクションの行範囲 (Begin 行, End 行) を返す。
    fn section_bounds(&self, name: &'static str) -> Result<(usize, usize), PbxprojError> {
        let begin_marker = format!("/* Begin {name} section */");
        let end_marker = format!("/* End {name} section */");
        let begin = self
            .lines
            .iter()
            .position(|l| l.contains(&begin_marker))
            .ok_or(PbxprojError::MissingSection(name))?;
        let end = self.lines[begin..]
            .iter()
            .position(|l| l.contains(&end_marker))
            .map(|offset| begin + offset)
            .ok_or(PbxprojError::MissingSection(name))?;
        Ok((begin, end))
    }

    /// 行頭のオブジェクト ID を取り出す (`\t\tID /* comment */ = {` 形式)。
    fn leading_id(line: &str) -> Option<&str> {
        let trimmed = line.trim_start();
        let id = trimmed.split_whitespace().next()?;
        let is_hex_id = id.len() == 24 && id.bytes().all(|b| b.is_ascii_hexdigit());
        is_hex_id.then_some(id)
    }

    // ------------------------------------------------------------------
    // 操作 1: PBXFileReference の追加
    // ------------------------------------------------------------------

    /// `.xcconfig` のファイル参照を追加し、オブジェクト ID を返す。
    ///
    /// 同名の参照が既に存在する場合は既存の ID を返す (冪等)。
    pub fn add_xcconfig_reference(
        &mut self,
        file_name: &str,
        path: &str,
    ) -> Result<String, PbxprojError> {
        let (begin, end) = self.section_bounds("PBXFileReference")?;

        let marker = format!("/* {file_name} */ = {{isa = PBXFileReference");
        for line in &self.lines[begin..end] {
            if line.contains(&marker) {
                if let Some(id) = Self::leading_id(line) {
                    return Ok(id.to_string());
                }
            }
        }

        let id = Self::object_id(&format!("PBXFileReference:{file_name}"));
        let entry = format!(
            "\t\t{id} /* {file_name} */ = {{isa = PBXFileReference; lastKnownFileType = text.xcconfig; name = {file_name}; path = {path}; sourceTree = \"<group>\"; }};"
        );
        self.lines.insert(end, entry);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // 操作 2: PBXGroup への追加
    // ------------------------------------------------------------------

    /// 指定グループの children に参照を追加する (冪等)。
    pub fn add_to_group(
        &mut self,
        group_name: &str,
        child_id: &str,
        child_comment: &str,
    ) -> Result<(), PbxprojError> {
        let (begin, end) = self.section_bounds("PBXGroup")?;

        let header_marker = format!("/* {group_name} */ = {{");
        let header = self.lines[begin..end]
            .iter()
            .position(|l| l.contains(&header_marker))
            .map(|offset| begin + offset)
            .ok_or_else(|| PbxprojError::GroupNotFound(group_name.to_string()))?;

        let children_open = self.lines[header..end]
            .iter()
            .position(|l| l.contains("children = ("))
            .map(|offset| header + offset)
            .ok_or_else(|| PbxprojError::GroupNotFound(group_name.to_string()))?;

        // children リスト内に既に存在すれば何もしない
        let mut idx = children_open + 1;
        while idx < end && !self.lines[idx].contains(");") {
            if self.lines[idx].contains(child_id) {
                return Ok(());
            }
            idx += 1;
        }

        let entry = format!("\t\t\t\t{child_id} /* {child_comment} */,");
        self.lines.insert(idx, entry);
        Ok(())
    }

    // ------------------------------------------------------------------
    // 操作 3: フレーバー別ビルド構成の追加
    // ------------------------------------------------------------------

    /// 全構成リストに `{Debug,Release,Profile}-{flavor}` を追加する。
    ///
    /// 各リストの既存 Debug/Release/Profile 構成を複製し、
    /// `baseConfigurationReference` をフレーバー用 `.xcconfig` に差し替える。
    /// 追加済みの構成はスキップするため冪等。追加した構成名一覧を返す。
    pub fn add_flavor(
        &mut self,
        flavor: &str,
        xcconfig_id: &str,
        xcconfig_file: &str,
    ) -> Result<Vec<String>, PbxprojError> {
        let mut added = Vec::new();

        // 行インデックスは挿入のたびにずれるため、1 件ずつ再走査して適用する
        while let Some(pending) = self.next_pending_flavor_config(flavor)? {
            let new_id =
                Self::object_id(&format!("{}:{}", pending.list_id, pending.new_name));
            self.clone_configuration(
                &pending.base_id,
                &pending.new_name,
                &new_id,
                xcconfig_id,
                xcconfig_file,
            )?;
            self.append_to_configuration_list(&pending.list_id, &new_id, &pending.new_name)?;
            added.push(pending.new_name);
        }

        Ok(added)
    }

    /// まだ追加されていないフレーバー構成を 1 件返す。
    fn next_pending_flavor_config(
        &self,
        flavor: &str,
    ) -> Result<Option<PendingFlavorConfig>, PbxprojError> {
        for list in self.parse_configuration_lists()? {
            let names: Vec<&str> = list.configs.iter().map(|(_, n)| n.as_str()).collect();
            for &base in BASE_CONFIGURATIONS {
                if !names.contains(&base) {
                    continue;
                }
                let new_name = format!("{base}-{flavor}");
                if names.contains(&new_name.as_str()) {
                    continue;
                }
                let base_id = list
                    .configs
                    .iter()
                    .find(|(_, n)| n == base)
                    .map(|(id, _)| id.clone())
                    .expect("base は names に含まれている");
                return Ok(Some(PendingFlavorConfig {
                    list_id: list.id,
                    base_id,
                    new_name,
                }));
            }
        }
        Ok(None)
    }

    /// XCConfigurationList セクションを解析する。
    fn parse_configuration_lists(&self) -> Result<Vec<ConfigurationList>, PbxprojError> {
        let (begin, end) = self.section_bounds("XCConfigurationList")?;
        let mut lists = Vec::new();
        let mut current: Option<ConfigurationList> = None;
        let mut in_configs = false;

        for line in &self.lines[begin + 1..end] {
            if let Some(id) = Self::leading_id(line) {
                if line.trim_end().ends_with("= {") {
                    // リストブロックの開始
                    current = Some(ConfigurationList {
                        id: id.to_string(),
                        configs: Vec::new(),
                    });
                    in_configs = false;
                    continue;
                }
                // buildConfigurations 内のエントリ行
                if in_configs {
                    if let Some(name) = Self::entry_comment(line) {
                        if let Some(list) = current.as_mut() {
                            list.configs.push((id.to_string(), name));
                        }
                    }
                    continue;
                }
            }
            if line.contains("buildConfigurations = (") {
                in_configs = true;
            } else if in_configs && line.contains(");") {
                in_configs = false;
            } else if line == "\t\t};" {
                if let Some(list) = current.take() {
                    lists.push(list);
                }
            }
        }

        Ok(lists)
    }

    /// エントリ行 `ID /* Name */,` からコメント部分を取り出す。
    fn entry_comment(line: &str) -> Option<String> {
        let start = line.find("/* ")? + 3;
        let end = line.find(" */")?;
        (start <= end).then(|| line[start..end].to_string())
    }

    /// ビルド構成ブロックを複製し、名前と baseConfigurationReference を差し替える。
    fn clone_configuration(
        &mut self,
        base_id: &str,
        new_name: &str,
        new_id: &str,
        xcconfig_id: &str,
        xcconfig_file: &str,
    ) -> Result<(), PbxprojError> {
        let (begin, end) = self.section_bounds("XCBuildConfiguration")?;

        // 複製元ブロックの範囲を特定する
        let block_start = self.lines[begin..end]
            .iter()
            .position(|l| Self::leading_id(l) == Some(base_id) && l.trim_end().ends_with("= {"))
            .map(|offset| begin + offset)
            .ok_or_else(|| PbxprojError::ConfigurationNotFound(base_id.to_string()))?;
        // ブロック終端は 2 タブの "};" のみ。buildSettings の閉じ (3 タブ) と
        // 区別するためインデントまで厳密に一致させる。
        let block_end = self.lines[block_start..end]
            .iter()
            .position(|l| l == "\t\t};")
            .map(|offset| block_start + offset)
            .ok_or_else(|| PbxprojError::ConfigurationNotFound(base_id.to_string()))?;

        let base_ref_line =
            format!("\t\t\tbaseConfigurationReference = {xcconfig_id} /* {xcconfig_file} */;");

        let mut cloned: Vec<String> = Vec::with_capacity(block_end - block_start + 1);
        let mut replaced_base_ref = false;
        for line in &self.lines[block_start..=block_end] {
            let trimmed = line.trim_start();
            if trimmed.starts_with(base_id) {
                cloned.push(format!("\t\t{new_id} /* {new_name} */ = {{"));
            } else if trimmed.starts_with("baseConfigurationReference") {
                cloned.push(base_ref_line.clone());
                replaced_base_ref = true;
            } else if trimmed.starts_with("name = ") {
                cloned.push(format!("\t\t\tname = {new_name};"));
            } else {
                cloned.push(line.clone());
            }
        }
        if !replaced_base_ref {
            // 複製元に baseConfigurationReference が無い場合は isa 行の直後に挿入
            let isa_pos = cloned
                .iter()
                .position(|l| l.contains("isa = XCBuildConfiguration;"))
                .ok_or_else(|| PbxprojError::ConfigurationNotFound(base_id.to_string()))?;
            cloned.insert(isa_pos + 1, base_ref_line);
        }

        // セクション末尾 (End マーカー直前) に挿入する
        let insert_at = end;
        for (offset, line) in cloned.into_iter().enumerate() {
            self.lines.insert(insert_at + offset, line);
        }
        Ok(())
    }

    /// 構成リストの buildConfigurations 末尾にエントリを追加する。
    fn append_to_configuration_list(
        &mut self,
        list_id: &str,
        new_id: &str,
        new_name: &str,
    ) -> Result<(), PbxprojError> {
        let (begin, end) = self.section_bounds("XCConfigurationList")?;

        let header = self.lines[begin..end]
            .iter()
            .position(|l| Self::leading_id(l) == Some(list_id) && l.trim_end().ends_with("= {"))
            .map(|offset| begin + offset)
            .ok_or_else(|| PbxprojError::ConfigurationNotFound(list_id.to_string()))?;

        let configs_open = self.lines[header..end]
            .iter()
            .position(|l| l.contains("buildConfigurations = ("))
            .map(|offset| header + offset)
            .ok_or_else(|| PbxprojError::ConfigurationNotFound(list_id.to_string()))?;

        let mut idx = configs_open + 1;
        while idx < end && !self.lines[idx].contains(");") {
            idx += 1;
        }

        self.lines
            .insert(idx, format!("\t\t\t\t{new_id} /* {new_name} */,"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// flutter create が生成する Runner プロジェクトの最小フィクスチャ。
    const FIXTURE: &str = "\
// !$*UTF8*$!
{
\tarchiveVersion = 1;
\tclasses = {
\t};
\tobjectVersion = 54;
\tobjects = {

/* Begin PBXFileReference section */
\t\t9740EEB21CF90195004384FC /* Debug.xcconfig */ = {isa = PBXFileReference; lastKnownFileType = text.xcconfig; name = Debug.xcconfig; path = Flutter/Debug.xcconfig; sourceTree = \"<group>\"; };
\t\t7AFA3C8E1D35360C0083082E /* Release.xcconfig */ = {isa = PBXFileReference; lastKnownFileType = text.xcconfig; name = Release.xcconfig; path = Flutter/Release.xcconfig; sourceTree = \"<group>\"; };
/* End PBXFileReference section */

/* Begin PBXGroup section */
\t\t9740EEB11CF90186004384FC /* Flutter */ = {
\t\t\tisa = PBXGroup;
\t\t\tchildren = (
\t\t\t\t9740EEB21CF90195004384FC /* Debug.xcconfig */,
\t\t\t\t7AFA3C8E1D35360C0083082E /* Release.xcconfig */,
\t\t\t);
\t\t\tname = Flutter;
\t\t\tsourceTree = \"<group>\";
\t\t};
/* End PBXGroup section */

/* Begin XCBuildConfiguration section */
\t\t97C147031CF9000F007C117D /* Debug */ = {
\t\t\tisa = XCBuildConfiguration;
\t\t\tbaseConfigurationReference = 9740EEB21CF90195004384FC /* Debug.xcconfig */;
\t\t\tbuildSettings = {
\t\t\t\tPRODUCT_NAME = \"$(TARGET_NAME)\";
\t\t\t};
\t\t\tname = Debug;
\t\t};
\t\t97C147041CF9000F007C117D /* Release */ = {
\t\t\tisa = XCBuildConfiguration;
\t\t\tbaseConfigurationReference = 7AFA3C8E1D35360C0083082E /* Release.xcconfig */;
\t\t\tbuildSettings = {
\t\t\t\tPRODUCT_NAME = \"$(TARGET_NAME)\";
\t\t\t};
\t\t\tname = Release;
\t\t};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
\t\t97C146E91CF9000F007C117D /* Build configuration list for PBXProject \"Runner\" */ = {
\t\t\tisa = XCConfigurationList;
\t\t\tbuildConfigurations = (
\t\t\t\t97C147031CF9000F007C117D /* Debug */,
\t\t\t\t97C147041CF9000F007C117D /* Release */,
\t\t\t);
\t\t\tdefaultConfigurationIsVisible = 0;
\t\t\tdefaultConfigurationName = Release;
\t\t};
/* End XCConfigurationList section */
\t};
\trootObject = 97C146E61CF9000F007C117D /* Project object */;
}
";

    #[test]
    fn test_parse_requires_utf8_header() {
        assert!(matches!(
            Pbxproj::parse("{ objects = {}; }"),
            Err(PbxprojError::InvalidHeader)
        ));
        assert!(Pbxproj::parse(FIXTURE).is_ok());
    }

    #[test]
    fn test_serialize_untouched_is_identity() {
        let proj = Pbxproj::parse(FIXTURE).unwrap();
        assert_eq!(proj.serialize(), FIXTURE);
    }

    #[test]
    fn test_object_id_deterministic() {
        let a = Pbxproj::object_id("PBXFileReference:staging.xcconfig");
        let b = Pbxproj::object_id("PBXFileReference:staging.xcconfig");
        let c = Pbxproj::object_id("PBXFileReference:production.xcconfig");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 24);
        assert!(a.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(a, a.to_uppercase());
    }

    #[test]
    fn test_add_xcconfig_reference() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let id = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();

        let out = proj.serialize();
        assert!(out.contains(&format!(
            "{id} /* staging.xcconfig */ = {{isa = PBXFileReference;"
        )));
        assert!(out.contains("path = Flutter/staging.xcconfig;"));
    }

    #[test]
    fn test_add_xcconfig_reference_idempotent() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let first = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();
        let lines_after_first = proj.lines.len();
        let second = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(proj.lines.len(), lines_after_first);
    }

    #[test]
    fn test_add_xcconfig_reference_reuses_existing_flutter_refs() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        // flutter create 由来の既存参照は新規作成せず既存 ID を返す
        let id = proj
            .add_xcconfig_reference("Debug.xcconfig", "Flutter/Debug.xcconfig")
            .unwrap();
        assert_eq!(id, "9740EEB21CF90195004384FC");
    }

    #[test]
    fn test_add_to_group() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let id = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();
        proj.add_to_group("Flutter", &id, "staging.xcconfig").unwrap();

        let out = proj.serialize();
        let children_start = out.find("children = (").unwrap();
        let children_end = out[children_start..].find(");").unwrap() + children_start;
        assert!(out[children_start..children_end].contains(&id));
    }

    #[test]
    fn test_add_to_group_idempotent() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let id = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();
        proj.add_to_group("Flutter", &id, "staging.xcconfig").unwrap();
        let lines_after_first = proj.lines.len();
        proj.add_to_group("Flutter", &id, "staging.xcconfig").unwrap();
        assert_eq!(proj.lines.len(), lines_after_first);
    }

    #[test]
    fn test_add_to_group_unknown_group() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let result = proj.add_to_group("NoSuchGroup", "AAAA", "x.xcconfig");
        assert!(matches!(result, Err(PbxprojError::GroupNotFound(_))));
    }

    #[test]
    fn test_add_flavor_adds_debug_and_release() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let xcconfig_id = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();
        let added = proj
            .add_flavor("staging", &xcconfig_id, "staging.xcconfig")
            .unwrap();

        // フィクスチャには Debug / Release のみ (Profile なし)
        assert_eq!(added, vec!["Debug-staging", "Release-staging"]);

        let out = proj.serialize();
        assert!(out.contains("/* Debug-staging */ = {"));
        assert!(out.contains("name = Debug-staging;"));
        assert!(out.contains("name = Release-staging;"));
        // 複製された構成の base は staging.xcconfig を指す
        assert!(out.contains(&format!(
            "baseConfigurationReference = {xcconfig_id} /* staging.xcconfig */;"
        )));
        // 構成リストにも登録されている
        let list_start = out.find("buildConfigurations = (").unwrap();
        let list_end = out[list_start..].find(");").unwrap() + list_start;
        assert!(out[list_start..list_end].contains("/* Debug-staging */"));
        assert!(out[list_start..list_end].contains("/* Release-staging */"));
    }

    #[test]
    fn test_add_flavor_preserves_build_settings() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let xcconfig_id = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();
        proj.add_flavor("staging", &xcconfig_id, "staging.xcconfig")
            .unwrap();

        // 複製ブロックにも buildSettings が残っている
        let out = proj.serialize();
        let debug_staging = out.find("/* Debug-staging */ = {").unwrap();
        let block = &out[debug_staging..debug_staging + 400];
        assert!(block.contains("PRODUCT_NAME = \"$(TARGET_NAME)\";"));
    }

    #[test]
    fn test_add_flavor_idempotent() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        let xcconfig_id = proj
            .add_xcconfig_reference("staging.xcconfig", "Flutter/staging.xcconfig")
            .unwrap();
        proj.add_flavor("staging", &xcconfig_id, "staging.xcconfig")
            .unwrap();
        let serialized = proj.serialize();

        let added = proj
            .add_flavor("staging", &xcconfig_id, "staging.xcconfig")
            .unwrap();
        assert!(added.is_empty());
        assert_eq!(proj.serialize(), serialized);
    }

    #[test]
    fn test_add_two_flavors() {
        let mut proj = Pbxproj::parse(FIXTURE).unwrap();
        for flavor in ["staging", "production"] {
            let file = format!("{flavor}.xcconfig");
            let id = proj
                .add_xcconfig_reference(&file, &format!("Flutter/{file}"))
                .unwrap();
            proj.add_to_group("Flutter", &id, &file).unwrap();
            proj.add_flavor(flavor, &id, &file).unwrap();
        }

        let out = proj.serialize();
        for name in [
            "Debug-staging",
            "Release-staging",
            "Debug-production",
            "Release-production",
        ] {
            assert!(out.contains(&format!("name = {name};")), "missing {name}");
        }
    }

    #[test]
    fn test_parse_configuration_lists() {
        let proj = Pbxproj::parse(FIXTURE).unwrap();
        let lists = proj.parse_configuration_lists().unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, "97C146E91CF9000F007C117D");
        assert_eq!(
            lists[0].configs,
            vec![
                (
                    "97C147031CF9000F007C117D".to_string(),
                    "Debug".to_string()
                ),
                (
                    "97C147041CF9000F007C117D".to_string(),
                    "Release".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_missing_section_error() {
        let mut proj =
            Pbxproj::parse("// !$*UTF8*$!\n{\n\tobjects = {\n\t};\n}\n").unwrap();
        let result = proj.add_xcconfig_reference("a.xcconfig", "Flutter/a.xcconfig");
        assert!(matches!(
            result,
            Err(PbxprojError::MissingSection("PBXFileReference"))
        ));
    }

    #[test]
    fn test_entry_comment() {
        assert_eq!(
            Pbxproj::entry_comment("\t\t\t\t97C147031CF9000F007C117D /* Debug */,"),
            Some("Debug".to_string())
        );
        assert_eq!(Pbxproj::entry_comment("no comment here"), None);
    }
}
