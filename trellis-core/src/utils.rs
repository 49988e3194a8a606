//! 容器内部的辅助工具：默认 Bean 名称、创建栈、依赖图检查

/// Bean 命名
pub mod naming {
    /// 首字母小写：`PersonService` -> `personService`
    ///
    /// ```
    /// use trellis_core::utils::naming::decapitalize;
    ///
    /// assert_eq!(decapitalize("PersonService"), "personService");
    /// assert_eq!(decapitalize("A"), "a");
    /// assert_eq!(decapitalize(""), "");
    /// ```
    pub fn decapitalize(name: &str) -> String {
        let mut chars = name.chars();
        chars
            .next()
            .map(|head| head.to_lowercase().chain(chars).collect())
            .unwrap_or_default()
    }

    /// 类型名的最后一段，不含泛型参数
    ///
    /// ```
    /// use trellis_core::utils::naming::simple_type_name;
    ///
    /// assert_eq!(simple_type_name("ioc_demo::service::PersonService"), "PersonService");
    /// assert_eq!(simple_type_name("alloc::sync::Arc<dyn demo::Adress>"), "Arc");
    /// ```
    pub fn simple_type_name(full_name: &str) -> &str {
        let end = full_name.find('<').unwrap_or(full_name.len());
        let path = &full_name[..end];
        path.rfind("::").map_or(path, |idx| &path[idx + 2..])
    }

    pub fn default_bean_name<T: ?Sized>() -> String {
        decapitalize(simple_type_name(std::any::type_name::<T>()))
    }
}

/// 创建栈与依赖图
pub mod dependency {
    use std::collections::HashMap;

    use parking_lot::Mutex;

    use crate::error::{ContainerError, ContainerResult};

    /// 正在创建的 Bean 名称，按进入顺序保存
    #[derive(Debug, Default)]
    pub struct CreationStack {
        names: Mutex<Vec<String>>,
    }

    /// 离开作用域时把 Bean 从创建栈中移除，创建失败时同样生效
    #[must_use]
    pub struct CreationGuard<'a> {
        stack: &'a CreationStack,
        name: String,
    }

    impl Drop for CreationGuard<'_> {
        fn drop(&mut self) {
            let mut names = self.stack.names.lock();
            if let Some(pos) = names.iter().rposition(|n| *n == self.name) {
                names.remove(pos);
            }
        }
    }

    impl CreationStack {
        pub fn new() -> Self {
            Self::default()
        }

        /// 压入 `name`；它已经在栈里时返回 `CircularDependency`，
        /// 消息为从栈底到 `name` 的完整链
        pub fn enter(&self, name: &str) -> ContainerResult<CreationGuard<'_>> {
            let mut names = self.names.lock();
            if names.iter().any(|n| n == name) {
                let chain = format!("{} -> {}", names.join(" -> "), name);
                tracing::error!("Circular reference while creating '{}': {}", name, chain);
                return Err(ContainerError::CircularDependency(chain));
            }
            names.push(name.to_string());
            Ok(CreationGuard {
                stack: self,
                name: name.to_string(),
            })
        }

        pub fn snapshot(&self) -> Vec<String> {
            self.names.lock().clone()
        }
    }

    #[derive(Clone, Copy)]
    enum Mark {
        Open,
        Done,
    }

    /// 检查 `depends-on` 声明：引用的 Bean 必须存在，且不能成环
    ///
    /// 按名称顺序遍历，报告的结果与 `HashMap` 的迭代顺序无关。
    pub fn check_dependency_graph(graph: &HashMap<String, Vec<String>>) -> ContainerResult<()> {
        let mut roots: Vec<&str> = graph.keys().map(String::as_str).collect();
        roots.sort_unstable();

        if let Some((bean, missing)) = roots.iter().find_map(|bean| {
            graph[*bean]
                .iter()
                .find(|dep| !graph.contains_key(*dep))
                .map(|dep| (*bean, dep.as_str()))
        }) {
            return Err(ContainerError::Config(format!(
                "Bean '{}' depends on '{}' which is not registered",
                bean, missing
            )));
        }

        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
        for root in roots {
            if marks.contains_key(root) {
                continue;
            }
            // 显式栈：(节点, 下一个要访问的依赖下标)
            let mut path: Vec<(&str, usize)> = vec![(root, 0)];
            marks.insert(root, Mark::Open);

            while let Some((node, next)) = path.last_mut() {
                let deps = &graph[*node];
                let Some(dep) = deps.get(*next).map(String::as_str) else {
                    marks.insert(*node, Mark::Done);
                    path.pop();
                    continue;
                };
                *next += 1;

                match marks.get(dep).copied() {
                    Some(Mark::Done) => {}
                    Some(Mark::Open) => {
                        let start = path.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                        let mut cycle: Vec<&str> = path[start..].iter().map(|(n, _)| *n).collect();
                        cycle.push(dep);
                        return Err(ContainerError::CircularDependency(cycle.join(" -> ")));
                    }
                    None => {
                        marks.insert(dep, Mark::Open);
                        path.push((dep, 0));
                    }
                }
            }
        }
        Ok(())
    }
}
