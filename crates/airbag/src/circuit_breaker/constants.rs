// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::Ratio;

/// Five failures out of the last five calls open the circuit.
pub(super) const DEFAULT_FAILURE_THRESHOLD: Ratio = Ratio::new_unchecked(5, 5);

/// Time spent open before trial calls are admitted.
pub(super) const DEFAULT_OPEN_DELAY: Duration = Duration::from_secs(30);

/// Three successes out of five trial calls close the circuit.
pub(super) const DEFAULT_SUCCESS_THRESHOLD: Ratio = Ratio::new_unchecked(3, 5);
