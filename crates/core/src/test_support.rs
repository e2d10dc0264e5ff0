// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proptest strategies shared by every crate's property tests.

use proptest::prelude::*;

use crate::instance::{AppType, Instance, InstanceStatus};
use crate::id::{InstanceId, ServerId};

pub fn arb_app_type() -> impl Strategy<Value = AppType> {
    prop_oneof![
        Just(AppType::Docker),
        Just(AppType::Eureka),
        Just(AppType::Site),
        Just(AppType::Service),
        Just(AppType::Smf),
        Just(AppType::Sysctl),
    ]
}

pub fn arb_instance_name() -> impl Strategy<Value = String> {
    "[a-z]{3,8}(_[0-9]{1,2})?"
}

prop_compose! {
    pub fn arb_instance()(
        name in arb_instance_name(),
        app_type in arb_app_type(),
    ) -> Instance {
        Instance::builder()
            .instance_name(name)
            .app_type(app_type)
            .status(InstanceStatus::Online)
            .build()
    }
}

pub fn arb_server_id() -> impl Strategy<Value = ServerId> {
    "[a-z]{4,10}".prop_map(|s| ServerId::from_string(format!("srv-{s}")))
}

pub fn arb_instance_id() -> impl Strategy<Value = InstanceId> {
    "[a-z]{4,10}".prop_map(|s| InstanceId::from_string(format!("ins-{s}")))
}
