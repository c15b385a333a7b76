//! 培训机构门户后端服务
//!
//! 基于 Actix Web 构建，覆盖管理员、导师、学生三类角色：
//! 账号与档案管理、选课、作业发布与提交（含宽限期与小组提交）、评分、考试报名与成绩。
//!
//! # 架构
//! - `cache`: 身份缓存（Moka/Redis）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证授权中间件
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数（JWT、密码、上传、校验）

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
