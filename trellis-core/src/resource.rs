//! 资源加载
//!
//! `classpath:` 前缀的位置在配置的 classpath 根目录中依次查找，
//! 其他位置按文件系统路径处理。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ContainerError, ContainerResult};

pub const CLASSPATH_URL_PREFIX: &str = "classpath:";

/// 资源句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// classpath 资源，`path` 为解析后的文件（找不到时为 None）
    ClassPath {
        location: String,
        path: Option<PathBuf>,
    },
    /// 文件系统资源
    File { path: PathBuf },
}

impl Resource {
    /// 资源是否存在
    pub fn exists(&self) -> bool {
        match self {
            Resource::ClassPath { path, .. } => path.as_ref().map(|p| p.exists()).unwrap_or(false),
            Resource::File { path } => path.exists(),
        }
    }

    /// 资源的文件名
    pub fn filename(&self) -> Option<String> {
        let name = match self {
            Resource::ClassPath { location, .. } => Path::new(location).file_name(),
            Resource::File { path } => path.file_name(),
        };
        name.map(|n| n.to_string_lossy().to_string())
    }

    /// 资源对应的绝对路径
    pub fn absolute_path(&self) -> ContainerResult<PathBuf> {
        let path = match self {
            Resource::ClassPath { location, path } => path.as_ref().ok_or_else(|| {
                ContainerError::Resource(format!(
                    "class path resource [{}] cannot be resolved to absolute file path because it does not exist",
                    location
                ))
            })?,
            Resource::File { path } => path,
        };

        path.canonicalize()
            .map_err(|e| ContainerError::Resource(format!("{}: {}", self, e)))
    }

    /// 读取资源内容
    pub fn read_to_string(&self) -> ContainerResult<String> {
        let path = self.absolute_path()?;
        fs::read_to_string(&path)
            .map_err(|e| ContainerError::Resource(format!("Failed to read {}: {}", self, e)))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::ClassPath { location, .. } => write!(f, "class path resource [{}]", location),
            Resource::File { path } => write!(f, "file [{}]", path.display()),
        }
    }
}

/// 资源加载器
#[derive(Debug, Clone, Default)]
pub struct ResourceLoader {
    classpath_roots: Vec<PathBuf>,
}

impl ResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 classpath 根目录，按添加顺序查找
    pub fn with_classpath_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.classpath_roots.push(root.into());
        self
    }

    pub fn add_classpath_root(&mut self, root: impl Into<PathBuf>) {
        self.classpath_roots.push(root.into());
    }

    pub fn classpath_roots(&self) -> &[PathBuf] {
        &self.classpath_roots
    }

    /// 根据位置获取资源句柄（不检查是否存在）
    pub fn get_resource(&self, location: &str) -> Resource {
        match location.strip_prefix(CLASSPATH_URL_PREFIX) {
            Some(relative) => {
                let relative = relative.trim_start_matches('/').to_string();
                let path = self
                    .classpath_roots
                    .iter()
                    .map(|root| root.join(&relative))
                    .find(|candidate| candidate.exists());
                tracing::trace!("Resolved classpath location '{}' to {:?}", relative, path);
                Resource::ClassPath {
                    location: relative,
                    path,
                }
            }
            None => Resource::File {
                path: PathBuf::from(location),
            },
        }
    }
}
