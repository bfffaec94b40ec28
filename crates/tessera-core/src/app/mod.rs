//! App - アプリケーション層
//!
//! domain と ports を組み合わせてオーケストレーターを組み立てる。
//!
//! # 主要コンポーネント
//! - **OrchestratorBuilder**: ports のワイヤリング
//! - **Orchestrator**: 登録 API・reroute・ナビゲーション横取り
//! - **LifecycleExecutor**: 1 アプリ 1 フェーズの実行（status ゲート付き）
//! - **NavigationLoop**: ナビゲーションイベントを reroute に変換するループ
//! - **AppManifest**: JSON でのアプリ宣言

pub mod builder;
pub mod executor;
pub mod manifest;
pub mod navigation;
pub mod orchestrator;
pub mod registry;
pub mod reroute;
pub mod status;
pub mod store;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, OrchestratorBuilder};
pub use self::executor::LifecycleExecutor;
pub use self::manifest::{AppDeclaration, AppManifest, ManifestError};
pub use self::navigation::NavigationLoop;
pub use self::orchestrator::Orchestrator;
pub use self::registry::AppRegistry;
pub use self::reroute::{
    AppChanges, ChangeSummary, RerouteHandle, RerouteMode, WorkSet, classify, compute_changes,
};
pub use self::status::StatusCounts;
pub use self::store::GlobalStore;
