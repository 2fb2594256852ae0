// 会话缓存模块
// 登录时写入、登出时删除，令牌随会话一起吊销

mod session;

pub use session::{CachedSession, SessionCache};
