//! Impls - ports のインメモリ実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **MemoryHost**: 履歴スタックとイベント配送を持つ HostWindow
//! - **InMemoryHostProvisioner**: 名前ごとに 1 つのコンテナを払い出す
//! - **StaticModuleLoader**: 事前登録したバンドルを返す ModuleLoader
//! - **TracingErrorHook**: 失敗を tracing に流す ErrorHook
//!
//! ブラウザ（wasm）向けの実装は別クレートに置く想定。

pub mod error_hook;
pub mod memory_host;
pub mod provisioner;
pub mod static_loader;

pub use self::error_hook::TracingErrorHook;
pub use self::memory_host::MemoryHost;
pub use self::provisioner::InMemoryHostProvisioner;
pub use self::static_loader::StaticModuleLoader;
