/* This is part of nodegyp-offline - which is under the MIT License ***********/

//! Installer scripts shipped in the bundles. They are run on the offline
//! machine, from the bundle directory.

use crate::archive::ArchiveFormat;
use crate::resolve::Platform;

pub fn file_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Windows => "node-gyp-offline-install.bat",
        Platform::Linux => "node-gyp-offline-install.sh",
    }
}

/// Whether the script must be made executable once written
pub fn is_executable(platform: Platform) -> bool {
    platform == Platform::Linux
}

fn windows(version: &str, arch: &str) -> String {
    format!(r"@echo off

SET CURRENT_PWD=%~dp0

echo install node-gyp for Node.js v{version} {arch}

%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/AppData/Roaming/ node-gyp-module.zip

echo install node-gyp depend
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/AppData/Local/node-gyp/Cache/ node-v{version}-headers.tar.gz
%CURRENT_PWD%/7za.exe rn %USERPROFILE%/AppData/Local/node-gyp/Cache/node-v{version}-headers.tar node-v{version} {version}
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/AppData/Local/node-gyp/Cache/ %USERPROFILE%/AppData/Local/node-gyp/Cache/node-v{version}-headers.tar
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/AppData/Local/ node-gyp-cache.zip
echo 9 > %USERPROFILE%/AppData/Local/node-gyp/Cache/{version}/installVersion

echo install cmake-js depend
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/.cmake-js node-v{version}-headers.tar.gz
%CURRENT_PWD%/7za.exe rn %USERPROFILE%/.cmake-js/node-v{version}-headers.tar node-v{version} v{version}
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/.cmake-js/node-ia32 %USERPROFILE%/.cmake-js/node-v{version}-headers.tar
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE%/.cmake-js/node-x64 %USERPROFILE%/.cmake-js/node-v{version}-headers.tar
%CURRENT_PWD%/7za.exe x -y -o%USERPROFILE% cmake-js-cache.zip

del /Q /F %USERPROFILE%\AppData\Local\node-gyp\Cache\node-v{version}-headers.tar
del /Q /F %USERPROFILE%\.cmake-js\node-v{version}-headers.tar

call node -v
call node-gyp -v
call cmake-js --version

pause
",
        version = version,
        arch = arch)
}

fn linux_7za(version: &str, arch: &str) -> String {
    format!(r#"#!/bin/bash

CURRENT_PWD=$(cd "$(dirname "$0")";pwd)
HOME_PWD=~
INSTALL_PWD=~/software
NODE_PWD=$INSTALL_PWD/node-v{version}-linux-{arch}

chmod +x $CURRENT_PWD/7za

echo '1. install Node.js v{version} {arch}'
mkdir -p $INSTALL_PWD
sudo rm -rf $NODE_PWD
$CURRENT_PWD/7za x -y -o$INSTALL_PWD $CURRENT_PWD/node-v{version}-linux-{arch}.tar.gz
$CURRENT_PWD/7za x -y -o$INSTALL_PWD $INSTALL_PWD/node-v{version}-linux-{arch}.tar
rm -rf $INSTALL_PWD/node-v{version}-linux-{arch}.tar

echo '2. install node-gyp for Node.js v{version} {arch}'
$CURRENT_PWD/7za x -y -o$NODE_PWD $CURRENT_PWD/node-gyp-module.zip
chmod +x $NODE_PWD/lib/node_modules/node-gyp/bin/node-gyp.js
ln -sb $NODE_PWD/lib/node_modules/node-gyp/bin/node-gyp.js $NODE_PWD/bin/node-gyp
chmod +x $NODE_PWD/lib/node_modules/cmake-js/bin/cmake-js
ln -sb $NODE_PWD/lib/node_modules/cmake-js/bin/cmake-js $NODE_PWD/bin/cmake-js
sudo ln -sb $NODE_PWD/bin/* /usr/local/bin/

echo '3. install node-gyp depend'
$CURRENT_PWD/7za x -y -o$HOME_PWD/.cache/node-gyp $CURRENT_PWD/node-v{version}-headers.tar.gz
$CURRENT_PWD/7za rn $HOME_PWD/.cache/node-gyp/node-v{version}-headers.tar node-v{version} {version}
$CURRENT_PWD/7za x -y -o$HOME_PWD/.cache/node-gyp/ $HOME_PWD/.cache/node-gyp/node-v{version}-headers.tar
echo 9 > $HOME_PWD/.cache/node-gyp/{version}/installVersion

echo '4. install cmake-js depend'
$CURRENT_PWD/7za x -y -o$HOME_PWD/.cmake-js $CURRENT_PWD/node-v{version}-headers.tar.gz
$CURRENT_PWD/7za rn $HOME_PWD/.cmake-js/node-v{version}-headers.tar node-v{version} v{version}
$CURRENT_PWD/7za x -y -o$HOME_PWD/.cmake-js/node-ia32 $HOME_PWD/.cmake-js/node-v{version}-headers.tar
$CURRENT_PWD/7za x -y -o$HOME_PWD/.cmake-js/node-x64 $HOME_PWD/.cmake-js/node-v{version}-headers.tar

rm -rf $HOME_PWD/.cache/node-gyp/node-v{version}-headers.tar
rm -rf $HOME_PWD/.cmake-js/node-v{version}-headers.tar

node -v
node-gyp -v
cmake-js --version
"#,
        version = version,
        arch = arch)
}

/// Same as linux_7za(), but the header caches were already laid out when
/// the bundle was assembled: everything is a plain tar.gz.
fn linux_tar(version: &str, arch: &str) -> String {
    format!(r#"#!/bin/bash

set -e

CURRENT_PWD=$(cd "$(dirname "$0")";pwd)
HOME_PWD=~
INSTALL_PWD=~/software
NODE_PWD=$INSTALL_PWD/node-v{version}-linux-{arch}

echo '1. install Node.js v{version} {arch}'
mkdir -p $INSTALL_PWD
sudo rm -rf $NODE_PWD
tar -xzf $CURRENT_PWD/node-v{version}-linux-{arch}.tar.gz -C $INSTALL_PWD

echo '2. install node-gyp for Node.js v{version} {arch}'
tar -xzf $CURRENT_PWD/node-gyp-module.tar.gz -C $NODE_PWD
chmod +x $NODE_PWD/lib/node_modules/node-gyp/bin/node-gyp.js
ln -sb $NODE_PWD/lib/node_modules/node-gyp/bin/node-gyp.js $NODE_PWD/bin/node-gyp
chmod +x $NODE_PWD/lib/node_modules/cmake-js/bin/cmake-js
ln -sb $NODE_PWD/lib/node_modules/cmake-js/bin/cmake-js $NODE_PWD/bin/cmake-js
sudo ln -sb $NODE_PWD/bin/* /usr/local/bin/

echo '3. install node-gyp depend'
mkdir -p $HOME_PWD/.cache
tar -xzf $CURRENT_PWD/node-gyp-cache.tar.gz -C $HOME_PWD/.cache

echo '4. install cmake-js depend'
tar -xzf $CURRENT_PWD/cmake-js-cache.tar.gz -C $HOME_PWD

node -v
node-gyp -v
cmake-js --version
"#,
        version = version,
        arch = arch)
}

/// Render the installer script of a bundle
pub fn render(platform: Platform, version: &str, arch: &str, format: ArchiveFormat) -> String {
    match (platform, format) {
        (Platform::Windows, _) => windows(version, arch),
        (Platform::Linux, ArchiveFormat::Zip) => linux_7za(version, arch),
        (Platform::Linux, ArchiveFormat::TarGz) => linux_tar(version, arch),
    }
}
