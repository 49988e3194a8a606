use crate::bean::SharedBean;
use crate::bean_factory::BeanFactory;
use crate::error::ContainerResult;

/// 在 init 回调前后拿到每个新建的实例，可以原样返回，也可以换成包装后的实例
///
/// 自动代理就是一个后置处理器：它在 init 之后把目标换成代理。
/// 原型 Bean 每次创建都会经过处理器。
pub trait BeanPostProcessor: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// 小的先执行
    fn order(&self) -> i32 {
        0
    }

    fn post_process_before_initialization(
        &self,
        bean: SharedBean,
        _bean_name: &str,
        _factory: &dyn BeanFactory,
    ) -> ContainerResult<SharedBean> {
        Ok(bean)
    }

    fn post_process_after_initialization(
        &self,
        bean: SharedBean,
        _bean_name: &str,
        _factory: &dyn BeanFactory,
    ) -> ContainerResult<SharedBean> {
        Ok(bean)
    }
}
