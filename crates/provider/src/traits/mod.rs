// This file is part of Autosend.
//
// Autosend is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Autosend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Autosend.
// If not, see https://www.gnu.org/licenses/.

//! Traits for the external services the engine talks to.

mod bundler;
#[cfg(feature = "test-utils")]
pub use bundler::MockBundlerApi;
pub use bundler::BundlerApi;

mod evm;
#[cfg(feature = "test-utils")]
pub use evm::MockEvmReader;
pub use evm::EvmReader;

mod identity;
#[cfg(feature = "test-utils")]
pub use identity::MockIdentityApi;
pub use identity::{IdentityApi, SessionInfo};
