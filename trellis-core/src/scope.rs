use std::fmt;
use std::str::FromStr;

/// 作用域：容器是否缓存实例
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// 整个容器共用一个实例
    #[default]
    Singleton,
    /// 每次请求都创建新实例，容器不负责销毁
    Prototype,
}

impl Scope {
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Singleton => "singleton",
            Scope::Prototype => "prototype",
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Scope::Singleton, Scope::Prototype]
            .into_iter()
            .find(|scope| scope.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown scope '{}', expected singleton or prototype", s))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
