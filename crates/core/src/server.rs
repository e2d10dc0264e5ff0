// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The host an instance lives on.

use serde::{Deserialize, Serialize};

use crate::id::ServerId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,
    pub name: String,
    pub host: String,
    pub ssh_port: u16,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ServerBuilder => Server {
        set { id: ServerId = ServerId::new() }
        into { name: String = "srv_a" }
        into { host: String = "10.0.0.1" }
        set { ssh_port: u16 = 22 }
    }
}
