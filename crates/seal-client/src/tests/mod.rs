// Copyright (c), Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0
