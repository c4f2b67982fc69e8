// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

use runtime_core::{cmdline::ServiceCmd, service::NullServiceCmd};

fn main() {
    NullServiceCmd::run()
}
