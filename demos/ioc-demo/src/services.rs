//! 人员和地址服务

use std::sync::Arc;

use crate::beans::{Adress, Person};

pub trait AdressService: Send + Sync {
    fn validate_adress(&self, adress: Option<&Adress>) -> bool;
}

/// 接受任何地址
#[derive(Debug, Default)]
pub struct AdressServiceTrue;

impl AdressService for AdressServiceTrue {
    fn validate_adress(&self, _adress: Option<&Adress>) -> bool {
        true
    }
}

/// 拒绝任何地址
#[derive(Debug, Default)]
pub struct AdressServiceFalse;

impl AdressService for AdressServiceFalse {
    fn validate_adress(&self, _adress: Option<&Adress>) -> bool {
        false
    }
}

pub trait PersonService: Send + Sync {
    /// 出生日期已知且地址服务接受其地址
    fn validate_person(&self, person: &Person) -> bool;

    fn name(&self) -> &'static str;
}

fn validate_with(adress_service: &dyn AdressService, person: &Person) -> bool {
    person.birth_date.is_some() && adress_service.validate_adress(person.adress.as_deref())
}

pub struct DefaultPersonService {
    adress_service: Arc<dyn AdressService>,
}

impl DefaultPersonService {
    pub fn new(adress_service: Arc<dyn AdressService>) -> Self {
        Self { adress_service }
    }
}

impl PersonService for DefaultPersonService {
    fn validate_person(&self, person: &Person) -> bool {
        validate_with(self.adress_service.as_ref(), person)
    }

    fn name(&self) -> &'static str {
        "DefaultPersonService"
    }
}

/// `env2` 环境下的人员服务
pub struct Env2PersonService {
    adress_service: Arc<dyn AdressService>,
}

impl Env2PersonService {
    pub fn new(adress_service: Arc<dyn AdressService>) -> Self {
        Self { adress_service }
    }
}

impl PersonService for Env2PersonService {
    fn validate_person(&self, person: &Person) -> bool {
        validate_with(self.adress_service.as_ref(), person)
    }

    fn name(&self) -> &'static str {
        "Env2PersonService"
    }
}
