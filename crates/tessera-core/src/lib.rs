//! tessera-core
//!
//! Micro-frontend orchestration: register apps, decide from the current
//! location which ones should be mounted, and drive their lifecycles.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（AppName, AppStatus, Phase, Location, Lifecycles, errors, events）
//! - **ports**: 抽象化レイヤー（ModuleLoader, HostProvisioner, HostWindow, ErrorHook）
//! - **app**: アプリケーションロジック（builder, orchestrator, executor, reroute, navigation）
//! - **impls**: 実装（MemoryHost, StaticModuleLoader など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

#[cfg(test)]
mod testing;

pub use self::app::{Orchestrator, OrchestratorBuilder};
