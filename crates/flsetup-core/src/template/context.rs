use heck::{ToLowerCamelCase, ToPascalCase};
use serde::Serialize;
use tera::Context;

/// テンプレートエンジンに渡す全変数を保持する構造体。
///
/// セットアップリクエストから導出ルールに従って全変数を自動計算して保持する。
#[derive(Debug, Clone, Serialize)]
pub struct TemplateContext {
    /// アプリ表示名
    pub app_name: String,
    /// プロジェクト名 (`snake_case`, Dart パッケージ名)
    pub project_name: String,
    /// プロジェクト名 (`PascalCase`, Dart クラス接頭辞として使用)
    pub class_prefix: String,
    /// プロジェクト名 (camelCase)
    pub project_name_camel: String,
    /// 組織識別子 (逆ドメイン形式)
    pub org: String,
    /// iOS Bundle ID (自動導出: org + "." + project_name のハイフン形)
    pub bundle_id: String,
    /// Android アプリケーション ID (自動導出: org + "." + project_name)
    pub android_package: String,
    /// アプリ説明文
    pub description: String,
    /// Firebase 有無
    pub has_firebase: bool,
    /// 有効化する Firebase 機能: firestore / auth / storage / ...
    pub firebase_features: Vec<String>,
    /// フレーバー名一覧 (Firebase 有効時のみ非空)
    pub flavors: Vec<String>,
    /// 対象プラットフォーム: android / ios / web / macos
    pub platforms: Vec<String>,
}

/// `TemplateContext` を構築するためのビルダー。
///
/// 最小限の入力値から導出ルールに従って残りの変数を自動計算する。
#[derive(Debug, Clone)]
pub struct TemplateContextBuilder {
    app_name: String,
    project_name: String,
    org: String,
    bundle_id: Option<String>,
    android_package: Option<String>,
    description: String,
    has_firebase: bool,
    firebase_features: Vec<String>,
    flavors: Vec<String>,
    platforms: Vec<String>,
}

/// アプリ説明文のデフォルト値。
const DEFAULT_DESCRIPTION: &str = "A new Flutter project.";

impl TemplateContextBuilder {
    /// 必須パラメータを指定してビルダーを作成する。
    ///
    /// # Arguments
    /// * `app_name` - アプリ表示名
    /// * `project_name` - プロジェクト名 (`snake_case`)
    /// * `org` - 組織識別子 (逆ドメイン形式)
    pub fn new(app_name: &str, project_name: &str, org: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            project_name: project_name.to_string(),
            org: org.to_string(),
            bundle_id: None,
            android_package: None,
            description: DEFAULT_DESCRIPTION.to_string(),
            has_firebase: false,
            firebase_features: Vec::new(),
            flavors: Vec::new(),
            platforms: vec!["android".to_string(), "ios".to_string()],
        }
    }

    /// アプリ説明文を設定する。
    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Bundle ID を明示指定する (未指定時は自動導出)。
    #[must_use]
    pub fn bundle_id(mut self, bundle_id: &str) -> Self {
        self.bundle_id = Some(bundle_id.to_string());
        self
    }

    /// Android アプリケーション ID を明示指定する (未指定時は自動導出)。
    #[must_use]
    pub fn android_package(mut self, package: &str) -> Self {
        self.android_package = Some(package.to_string());
        self
    }

    /// Firebase を有効にする。
    #[must_use]
    pub fn with_firebase(mut self, features: Vec<String>) -> Self {
        self.has_firebase = true;
        self.firebase_features = features;
        self
    }

    /// フレーバー一覧を設定する。
    #[must_use]
    pub fn flavors(mut self, flavors: Vec<String>) -> Self {
        self.flavors = flavors;
        self
    }

    /// 対象プラットフォームを設定する。
    #[must_use]
    pub fn platforms(mut self, platforms: Vec<String>) -> Self {
        self.platforms = platforms;
        self
    }

    /// `TemplateContext` を構築する。
    pub fn build(self) -> TemplateContext {
        let class_prefix = self.project_name.to_pascal_case();
        let project_name_camel = self.project_name.to_lower_camel_case();

        // bundle_id の導出: アンダースコアは iOS で無効のためハイフンに置換
        let bundle_id = self.bundle_id.unwrap_or_else(|| {
            format!("{}.{}", self.org, self.project_name.replace('_', "-"))
        });

        // android_package の導出: Java パッケージ名はアンダースコアのまま
        let android_package = self
            .android_package
            .unwrap_or_else(|| format!("{}.{}", self.org, self.project_name));

        TemplateContext {
            app_name: self.app_name,
            project_name: self.project_name,
            class_prefix,
            project_name_camel,
            org: self.org,
            bundle_id,
            android_package,
            description: self.description,
            has_firebase: self.has_firebase,
            firebase_features: self.firebase_features,
            flavors: self.flavors,
            platforms: self.platforms,
        }
    }
}

impl TemplateContext {
    /// `TemplateContext` を Tera の Context に変換する。
    ///
    /// 全フィールドを個別の変数として挿入する。テンプレート内で
    /// `{{ project_name }}` のようにフラットにアクセスできる。
    pub fn to_tera_context(&self) -> Context {
        let mut ctx = Context::new();
        ctx.insert("app_name", &self.app_name);
        ctx.insert("project_name", &self.project_name);
        ctx.insert("class_prefix", &self.class_prefix);
        ctx.insert("project_name_camel", &self.project_name_camel);
        ctx.insert("org", &self.org);
        ctx.insert("bundle_id", &self.bundle_id);
        ctx.insert("android_package", &self.android_package);
        ctx.insert("description", &self.description);
        ctx.insert("has_firebase", &self.has_firebase);
        ctx.insert("firebase_features", &self.firebase_features);
        ctx.insert("flavors", &self.flavors);
        ctx.insert("platforms", &self.platforms);
        ctx
    }
}
