//! Ports - 外部コラボレーターとの境界
//!
//! オーケストレーター本体はこれらの trait にのみ依存し、
//! DOM・スクリプト読み込み・ブラウザ履歴などの実体は知らない。
//!
//! - **ModuleLoader**: markup 参照をライフサイクル関数列に解決
//! - **HostProvisioner**: アプリごとのホストコンテナを用意
//! - **HostWindow**: ナビゲーション位置・履歴操作・イベント登録
//! - **ErrorHook**: フェーズ失敗のプロセス全体への通知

pub mod error_hook;
pub mod host_provisioner;
pub mod host_window;
pub mod module_loader;

pub use self::error_hook::ErrorHook;
pub use self::host_provisioner::HostProvisioner;
pub use self::host_window::{HostWindow, Listener};
pub use self::module_loader::ModuleLoader;
